// Reporting views: read-only projections over the filtered window, bundled
// into a `ViewModel` by the pure `render` pipeline. The interactive shell
// only prints what it finds here; every selection change re-runs `render`.
use crate::reports;
use crate::types::{
    Alert, ChartKind, ChartSpec, CountByDayRow, CountByKeyRow, MapSpec, Marker, PhotoStatus,
    RankingRow, VisitForm,
};
use crate::window::{self, DateWindow, Mode};
use crate::source::Dataset;
use chrono::{Duration, NaiveDate};
use std::path::Path;

const LOW_DISTANCE_KM: f64 = 10.0;
const LOW_ACTIVITY_FORMS: usize = 2;

#[derive(Debug, Clone)]
pub struct ActivityView {
    pub total_distance_km: f64,
    pub total_trips: usize,
    pub total_travel_time: Duration,
    pub trips_per_day: Vec<CountByDayRow>,
    pub chart: ChartSpec,
}

#[derive(Debug, Clone)]
pub struct FormDetail {
    pub form: VisitForm,
    pub photo: PhotoStatus,
}

#[derive(Debug, Clone)]
pub struct ClientDetail {
    pub client: String,
    pub records: Vec<FormDetail>,
}

#[derive(Debug, Clone)]
pub struct FormsView {
    pub total_forms: usize,
    pub type_distribution: Vec<CountByKeyRow>,
    pub type_chart: ChartSpec,
    pub per_employee: Vec<CountByKeyRow>,
    pub employee_chart: ChartSpec,
    pub per_day: Vec<CountByDayRow>,
    pub per_day_chart: ChartSpec,
    /// Distinct non-empty clients available for the detail selector.
    pub clients: Vec<String>,
    pub detail: Option<ClientDetail>,
}

#[derive(Debug, Clone)]
pub struct GeoView {
    pub map: MapSpec,
    /// True when no form in the window carries both coordinates.
    pub no_coordinates: bool,
    pub alerts: Vec<Alert>,
    pub ranking: Vec<RankingRow>,
    pub ranking_chart: ChartSpec,
}

#[derive(Debug, Clone)]
pub struct ViewModel {
    pub mode: Mode,
    pub window: DateWindow,
    pub activity: ActivityView,
    pub forms: FormsView,
    pub geo: GeoView,
}

/// Run the whole reporting pipeline for one selection: resolve the window,
/// filter both datasets, aggregate, and project the three views. Pure
/// except for the photo existence check inside the detail projection.
pub fn render(
    dataset: &Dataset,
    mode: Mode,
    anchor: NaiveDate,
    client_selection: Option<&str>,
    photo_dir: &Path,
) -> ViewModel {
    let win = window::resolve(mode, anchor);
    let trips = reports::filter_trips(&dataset.trips, &win);
    let forms = reports::filter_forms(&dataset.forms, &win);

    let total_distance_km = reports::total_distance_km(&trips);
    let trips_per_day = reports::trips_per_day(&trips);
    let activity = ActivityView {
        total_distance_km,
        total_trips: reports::total_trip_count(&trips),
        total_travel_time: reports::total_travel_time(&trips),
        chart: day_chart("Desplazamientos por Día", &trips_per_day),
        trips_per_day,
    };

    let type_distribution = reports::form_type_distribution(&forms);
    let per_employee = reports::forms_per_employee(&forms);
    let per_day = reports::forms_per_day(&forms);
    let detail = client_selection.map(|client| ClientDetail {
        client: client.to_string(),
        records: reports::forms_for_client(&forms, client)
            .into_iter()
            .map(|f| FormDetail {
                photo: resolve_photo(f.photo.as_deref(), photo_dir),
                form: f.clone(),
            })
            .collect(),
    });
    let forms_view = FormsView {
        total_forms: forms.len(),
        type_chart: key_chart(
            ChartKind::Pie,
            "Tipos de formularios llenados",
            &type_distribution,
        ),
        type_distribution,
        employee_chart: key_chart(
            ChartKind::Bar,
            "Formularios llenados por empleado",
            &per_employee,
        ),
        per_employee,
        per_day_chart: day_chart("Formularios por fecha", &per_day),
        per_day,
        clients: reports::distinct_clients(&forms),
        detail,
    };

    let map = map_spec(&forms);
    let ranking = reports::employee_ranking(&forms);
    let geo = GeoView {
        no_coordinates: map.markers.is_empty(),
        map,
        alerts: evaluate_alerts(mode, total_distance_km, forms.len()),
        ranking_chart: ChartSpec {
            kind: ChartKind::Bar,
            title: "Ranking semanal".to_string(),
            labels: ranking.iter().map(|r| r.employee.clone()).collect(),
            values: ranking.iter().map(|r| r.forms as f64).collect(),
        },
        ranking,
    };

    ViewModel {
        mode,
        window: win,
        activity,
        forms: forms_view,
        geo,
    }
}

/// Best-effort resolution of a form's photo reference. An http(s) reference
/// passes through untouched; anything else is checked against the photo base
/// directory and degrades to `NotFound` instead of erroring the view.
pub fn resolve_photo(reference: Option<&str>, photo_dir: &Path) -> PhotoStatus {
    let Some(name) = reference.map(str::trim).filter(|n| !n.is_empty()) else {
        return PhotoStatus::None;
    };
    if name.starts_with("http://") || name.starts_with("https://") {
        return PhotoStatus::Remote(name.to_string());
    }
    let path = photo_dir.join(name);
    if path.is_file() {
        PhotoStatus::Local(path.to_string_lossy().into_owned())
    } else {
        PhotoStatus::NotFound(name.to_string())
    }
}

// Only forms carrying both coordinates are plotted; the rest are silently
// excluded from markers and heat alike.
fn map_spec(forms: &[VisitForm]) -> MapSpec {
    let mut markers = Vec::new();
    let mut heat = Vec::new();
    for f in forms {
        if let (Some(lat), Some(lon)) = (f.latitude, f.longitude) {
            markers.push(Marker {
                latitude: lat,
                longitude: lon,
                label: format!("{} - {}", f.client, f.submitted_date()),
            });
            heat.push([lat, lon]);
        }
    }
    MapSpec { markers, heat }
}

// Alert rules only apply to the weekly report.
fn evaluate_alerts(mode: Mode, total_distance_km: f64, form_count: usize) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if mode == Mode::Weekly {
        if total_distance_km < LOW_DISTANCE_KM {
            alerts.push(Alert::LowDistance);
        }
        if form_count < LOW_ACTIVITY_FORMS {
            alerts.push(Alert::LowActivity);
        }
    }
    alerts
}

fn day_chart(title: &str, rows: &[CountByDayRow]) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Bar,
        title: title.to_string(),
        labels: rows.iter().map(|r| r.date.to_string()).collect(),
        values: rows.iter().map(|r| r.count as f64).collect(),
    }
}

fn key_chart(kind: ChartKind, title: &str, rows: &[CountByKeyRow]) -> ChartSpec {
    ChartSpec {
        kind,
        title: title.to_string(),
        labels: rows.iter().map(|r| r.key.clone()).collect(),
        values: rows.iter().map(|r| r.count as f64).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trip;
    use std::io::Write;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn trip(day: u32, km: f64) -> Trip {
        Trip {
            date: d(day),
            distance_km: km,
            travel_time: "0:30:00".to_string(),
        }
    }

    fn form(day: u32, employee: &str, client: &str, coords: Option<(f64, f64)>) -> VisitForm {
        VisitForm {
            submitted_at: d(day).and_hms_opt(10, 0, 0).unwrap(),
            employee: employee.to_string(),
            client: client.to_string(),
            form_name: "Visita".to_string(),
            form_type: "Visita médica".to_string(),
            address: String::new(),
            contact_name: String::new(),
            activity: "Presentación".to_string(),
            visited: String::new(),
            notes: String::new(),
            photo: None,
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
        }
    }

    fn dataset(trips: Vec<Trip>, forms: Vec<VisitForm>) -> Dataset {
        Dataset { trips, forms }
    }

    // Anchor 2024-03-07 (Thursday) resolves the weekly window to
    // [2024-03-04, 2024-03-09].
    const ANCHOR: u32 = 7;

    #[test]
    fn weekly_render_filters_and_sums() {
        let data = dataset(
            vec![trip(5, 12.5), trip(10, 7.0)],
            vec![form(5, "Ana", "Clínica Norte", None)],
        );
        let vm = render(&data, Mode::Weekly, d(ANCHOR), None, Path::new("."));
        assert_eq!(vm.window.start, d(4));
        assert_eq!(vm.window.end, d(9));
        assert_eq!(vm.activity.total_trips, 1);
        assert_eq!(vm.activity.total_distance_km, 12.5);
        // 12.5 km >= 10, so no low-distance alert; a single form still
        // trips the low-activity rule.
        assert_eq!(vm.geo.alerts, vec![Alert::LowActivity]);
    }

    #[test]
    fn low_distance_alert_fires_below_threshold() {
        let data = dataset(
            vec![trip(5, 4.0)],
            vec![
                form(5, "Ana", "A", None),
                form(6, "Ana", "B", None),
            ],
        );
        let vm = render(&data, Mode::Weekly, d(ANCHOR), None, Path::new("."));
        assert_eq!(vm.geo.alerts, vec![Alert::LowDistance]);
    }

    #[test]
    fn alerts_only_apply_to_weekly_mode() {
        let data = dataset(vec![], vec![]);
        let vm = render(&data, Mode::Daily, d(ANCHOR), None, Path::new("."));
        assert!(vm.geo.alerts.is_empty());
        let vm = render(&data, Mode::Monthly, d(ANCHOR), None, Path::new("."));
        assert!(vm.geo.alerts.is_empty());
    }

    #[test]
    fn geo_view_excludes_forms_missing_either_coordinate() {
        let mut half = form(5, "Ana", "B", None);
        half.latitude = Some(18.5);
        let data = dataset(
            vec![],
            vec![
                form(5, "Ana", "A", Some((18.48, -69.91))),
                half,
                form(6, "Beto", "C", None),
            ],
        );
        let vm = render(&data, Mode::Weekly, d(ANCHOR), None, Path::new("."));
        assert_eq!(vm.geo.map.markers.len(), 1);
        assert_eq!(vm.geo.map.heat, vec![[18.48, -69.91]]);
        assert_eq!(vm.geo.map.markers[0].label, "A - 2024-03-05");
        assert!(!vm.geo.no_coordinates);
    }

    #[test]
    fn geo_view_flags_a_window_with_no_coordinates() {
        let data = dataset(vec![], vec![form(5, "Ana", "A", None)]);
        let vm = render(&data, Mode::Weekly, d(ANCHOR), None, Path::new("."));
        assert!(vm.geo.no_coordinates);
        assert!(vm.geo.map.heat.is_empty());
    }

    #[test]
    fn empty_window_renders_empty_views_not_errors() {
        let data = dataset(vec![], vec![]);
        let vm = render(&data, Mode::Weekly, d(ANCHOR), None, Path::new("."));
        assert_eq!(vm.activity.total_distance_km, 0.0);
        assert_eq!(vm.activity.total_travel_time, Duration::zero());
        assert!(vm.activity.trips_per_day.is_empty());
        assert_eq!(vm.forms.total_forms, 0);
        assert!(vm.forms.clients.is_empty());
        assert!(vm.geo.ranking.is_empty());
    }

    #[test]
    fn client_detail_lists_only_that_client() {
        let data = dataset(
            vec![],
            vec![
                form(5, "Ana", "Clínica Norte", None),
                form(6, "Beto", "Clínica Sur", None),
            ],
        );
        let vm = render(
            &data,
            Mode::Weekly,
            d(ANCHOR),
            Some("Clínica Norte"),
            Path::new("."),
        );
        let detail = vm.forms.detail.unwrap();
        assert_eq!(detail.records.len(), 1);
        assert_eq!(detail.records[0].form.employee, "Ana");
        assert_eq!(detail.records[0].photo, PhotoStatus::None);
    }

    #[test]
    fn photo_resolution_covers_every_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("foto1.jpg")).unwrap();
        f.write_all(b"jpg").unwrap();

        assert!(matches!(
            resolve_photo(Some("foto1.jpg"), dir.path()),
            PhotoStatus::Local(_)
        ));
        assert_eq!(
            resolve_photo(Some("https://example.com/f.jpg"), dir.path()),
            PhotoStatus::Remote("https://example.com/f.jpg".to_string())
        );
        assert_eq!(
            resolve_photo(Some("missing.jpg"), dir.path()),
            PhotoStatus::NotFound("missing.jpg".to_string())
        );
        assert_eq!(resolve_photo(None, dir.path()), PhotoStatus::None);
        assert_eq!(resolve_photo(Some("  "), dir.path()), PhotoStatus::None);
    }

    #[test]
    fn charts_mirror_their_aggregates() {
        let data = dataset(
            vec![trip(5, 1.0), trip(5, 2.0), trip(6, 3.0)],
            vec![form(5, "Ana", "A", None), form(5, "Beto", "B", None)],
        );
        let vm = render(&data, Mode::Weekly, d(ANCHOR), None, Path::new("."));
        assert_eq!(vm.activity.chart.kind, ChartKind::Bar);
        assert_eq!(vm.activity.chart.labels, vec!["2024-03-05", "2024-03-06"]);
        assert_eq!(vm.activity.chart.values, vec![2.0, 1.0]);
        assert_eq!(vm.forms.type_chart.kind, ChartKind::Pie);
        assert_eq!(vm.forms.employee_chart.labels, vec!["Ana", "Beto"]);
    }
}
