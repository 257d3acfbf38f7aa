// Entry point and high-level CLI flow.
//
// The terminal menu is the interactive shell around the pure reporting
// pipeline in `views::render`:
// - Option [1] loads both sheets through the source adapter, printing
//   row diagnostics.
// - Option [2] selects the reporting period (mode + anchor date).
// - Options [3]-[5] re-run the pipeline and print one view each; [4] can
//   drill into a client and export the PDF, [5] writes the map artifact.
mod error;
mod output;
mod pdf;
mod reports;
mod source;
mod types;
mod util;
mod views;
mod window;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use source::{DataSource, Dataset, SourceKind};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use types::{Alert, PhotoStatus};
use window::Mode;

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const MAP_ARTIFACT: &str = "mapa_zonas.json";

// In-memory app state: the source adapter (which owns the remote cache),
// the loaded dataset, and the current period selection.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::from_env()));

struct AppState {
    source: DataSource,
    dataset: Option<Dataset>,
    mode: Mode,
    anchor: NaiveDate,
    photo_dir: PathBuf,
}

impl AppState {
    // Configuration comes from the environment with working defaults:
    // FIELD_REPORT_SOURCE is either a directory with VIAJES.csv and
    // FORMULARIO.csv or `sheet:<document-id>` for the remote export.
    fn from_env() -> Self {
        let raw_source =
            std::env::var("FIELD_REPORT_SOURCE").unwrap_or_else(|_| "gestion_externa".to_string());
        let kind = match raw_source.strip_prefix("sheet:") {
            Some(id) => SourceKind::RemoteSheet {
                document_id: id.to_string(),
            },
            None => SourceKind::LocalDir(PathBuf::from(raw_source)),
        };
        let ttl = std::env::var("FIELD_REPORT_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);
        let photo_dir = std::env::var("FIELD_REPORT_PHOTO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("gestion_externa"));
        AppState {
            source: DataSource::new(kind, Duration::from_secs(ttl)),
            dataset: None,
            mode: Mode::Daily,
            anchor: chrono::Local::now().date_naive(),
            photo_dir,
        }
    }
}

/// Read a single line of input after printing a prompt.
fn prompt(msg: &str) -> String {
    print!("{}", msg);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn prompt_yes_no(msg: &str) -> bool {
    loop {
        match prompt(msg).to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load both sheets and keep the dataset in memory.
///
/// A failed fetch or schema check halts the load; nothing partial is stored.
fn handle_load() {
    let mut state = APP_STATE.lock().unwrap();
    match state.source.load() {
        Ok((dataset, report)) => {
            println!(
                "Loaded {} trips and {} forms.",
                util::format_int(report.trip_rows as i64),
                util::format_int(report.form_rows as i64)
            );
            if report.skipped_trips + report.skipped_forms > 0 {
                println!(
                    "Note: {} rows skipped due to parse errors.",
                    util::format_int((report.skipped_trips + report.skipped_forms) as i64)
                );
            }
            println!("");
            state.dataset = Some(dataset);
        }
        Err(e) => {
            eprintln!("Failed to load data: {}\n", e);
        }
    }
}

/// Handle option [2]: pick mode and anchor date for the reporting window.
fn handle_period() {
    let mode = match prompt("Mode (daily/weekly/monthly): ").parse::<Mode>() {
        Ok(m) => m,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };
    let anchor = match NaiveDate::parse_from_str(&prompt("Anchor date (YYYY-MM-DD): "), "%Y-%m-%d")
    {
        Ok(d) => d,
        Err(_) => {
            println!("Invalid date. Expected YYYY-MM-DD.\n");
            return;
        }
    };
    let mut state = APP_STATE.lock().unwrap();
    state.mode = mode;
    state.anchor = anchor;
    let win = window::resolve(mode, anchor);
    println!("Period: {} ({} to {})\n", mode, win.start, win.end);
}

// Pulls a render out of the shared state, or complains if no data is loaded.
fn render_current(client: Option<&str>) -> Option<views::ViewModel> {
    let state = APP_STATE.lock().unwrap();
    let Some(dataset) = &state.dataset else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return None;
    };
    Some(views::render(
        dataset,
        state.mode,
        state.anchor,
        client,
        &state.photo_dir,
    ))
}

/// Handle option [3]: activity summary over the current window.
fn handle_activity() {
    let Some(vm) = render_current(None) else { return };
    println!("Resumen de Actividad");
    println!("Desde {} hasta {}\n", vm.window.start, vm.window.end);
    println!(
        "KM recorridos: {} KM",
        util::format_number(vm.activity.total_distance_km, 2)
    );
    println!("Total de viajes: {}", vm.activity.total_trips);
    println!(
        "Tiempo total viaje: {}\n",
        util::format_duration_hms(vm.activity.total_travel_time)
    );
    if vm.activity.trips_per_day.is_empty() {
        println!("No trips in this period.\n");
    } else {
        println!("{}", vm.activity.chart.title);
        output::preview_table_rows(&vm.activity.trips_per_day, usize::MAX);
    }
}

/// Handle option [4]: forms report, optional client drill-down, PDF export.
fn handle_forms() {
    let Some(vm) = render_current(None) else { return };
    if vm.forms.total_forms == 0 {
        println!("No hay formularios en este período.\n");
        return;
    }
    println!("Formularios registrados: {}\n", vm.forms.total_forms);

    println!("{}", vm.forms.type_chart.title);
    output::preview_table_rows(&vm.forms.type_distribution, usize::MAX);
    println!("{}", vm.forms.employee_chart.title);
    output::preview_table_rows(&vm.forms.per_employee, usize::MAX);
    println!("{}", vm.forms.per_day_chart.title);
    output::preview_table_rows(&vm.forms.per_day, usize::MAX);

    if !vm.forms.clients.is_empty() {
        println!("Clients in this period:");
        for (i, client) in vm.forms.clients.iter().enumerate() {
            println!("[{}] {}", i + 1, client);
        }
        let choice = prompt("Select client number (or blank to skip): ");
        if let Ok(idx) = choice.parse::<usize>() {
            match idx.checked_sub(1).and_then(|i| vm.forms.clients.get(i)) {
                Some(client) => print_client_detail(client),
                None => println!("No such client number.\n"),
            }
        }
    }

    if prompt_yes_no("Export PDF of forms (Y/N): ") {
        export_pdf();
    }
}

fn print_client_detail(client: &str) {
    let Some(vm) = render_current(Some(client)) else { return };
    let Some(detail) = vm.forms.detail else { return };
    println!("\nDetalle por cliente: {}", detail.client);
    for record in &detail.records {
        let f = &record.form;
        println!("\n{} - {}", f.submitted_date(), f.form_name);
        println!("  Dirección: {}", f.address);
        println!("  Doctor/Clínica: {}", f.contact_name);
        println!("  Actividad: {}", f.activity);
        println!("  Visitado: {}", f.visited);
        println!("  Notas: {}", f.notes);
        match &record.photo {
            PhotoStatus::Local(path) => println!("  Foto: {}", path),
            PhotoStatus::Remote(url) => println!("  Foto (remota): {}", url),
            PhotoStatus::NotFound(name) => {
                println!("  Aviso: no se encontró la imagen: {}", name)
            }
            PhotoStatus::None => {}
        }
    }
    println!("");
}

fn export_pdf() {
    let Some(vm) = render_current(None) else { return };
    let state = APP_STATE.lock().unwrap();
    let Some(dataset) = &state.dataset else { return };
    let forms = reports::filter_forms(&dataset.forms, &vm.window);
    let bytes = pdf::export(&forms, &vm.window);
    match output::write_bytes(pdf::EXPORT_FILENAME, &bytes) {
        Ok(()) => println!("PDF saved to {}\n", pdf::EXPORT_FILENAME),
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

/// Handle option [5]: map artifact, weekly alerts and the employee ranking.
fn handle_map() {
    let Some(vm) = render_current(None) else { return };
    println!("Zonas visitadas");
    if vm.geo.no_coordinates {
        println!("No hay coordenadas disponibles.\n");
    } else {
        match output::write_json(MAP_ARTIFACT, &vm.geo.map) {
            Ok(()) => println!(
                "Map with {} markers saved to {}\n",
                vm.geo.map.markers.len(),
                MAP_ARTIFACT
            ),
            Err(e) => eprintln!("Write error: {}\n", e),
        }
    }

    println!("Alertas automáticas");
    if vm.geo.alerts.is_empty() {
        println!("(none)\n");
    } else {
        for alert in &vm.geo.alerts {
            match alert {
                Alert::LowDistance => println!("Menos de 10 KM esta semana."),
                Alert::LowActivity => println!("Menos de 2 formularios esta semana."),
            }
        }
        println!("");
    }

    println!("Ranking semanal por formularios");
    output::preview_table_rows(&vm.geo.ranking, usize::MAX);
}

fn main() {
    env_logger::init();
    loop {
        println!("Panel Vendedores Externos");
        println!("[1] Load data");
        println!("[2] Select report period");
        println!("[3] Activity summary");
        println!("[4] Forms report");
        println!("[5] Map & alerts");
        println!("[6] Exit\n");
        match prompt("Enter choice: ").as_str() {
            "1" => handle_load(),
            "2" => handle_period(),
            "3" => handle_activity(),
            "4" => handle_forms(),
            "5" => handle_map(),
            "6" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 1-6.\n");
            }
        }
    }
}
