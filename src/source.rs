// Data source adapter: fetches the VIAJES and FORMULARIO sheets from a
// local CSV directory or a remote spreadsheet export endpoint, validates
// the schema, and parses rows into typed records.
//
// The remote fetch is cached as raw CSV text with a TTL, keyed by the fixed
// document id. Filtering happens downstream, so one cached copy serves every
// window.
use crate::error::ReportError;
use crate::types::{RawFormRow, RawTripRow, Trip, VisitForm};
use crate::util::{parse_date_safe, parse_datetime_safe, parse_f64_safe};
use csv::ReaderBuilder;
use log::{info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const TRIPS_SHEET: &str = "VIAJES";
pub const FORMS_SHEET: &str = "FORMULARIO";

const TRIPS_COLUMNS: &[&str] = &["FECHA", "Distancia recorrida total km", "Tiempo de viaje"];
const FORMS_COLUMNS: &[&str] = &[
    "Fecha de llenar",
    "Empleado",
    "Tarea",
    "Nombre de formulario",
    "Tipo",
    "Dirección de envío",
    "¿Cuál es el nombre del Doctor/ la Clínica?",
    "¿Qué actividades realizaste?",
    "¿A quién visitaste?",
    "Notas adicionales sobre la visita",
    "Evidencia Fotográfica",
    "Latitud",
    "Longitud",
];

#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Directory containing `VIAJES.csv` and `FORMULARIO.csv`.
    LocalDir(PathBuf),
    /// Remote shared-spreadsheet document, fetched through its CSV export
    /// endpoint one sheet at a time.
    RemoteSheet { document_id: String },
}

/// Both sheets, fully parsed. Never partial: a failed fetch or schema check
/// yields an error instead.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub trips: Vec<Trip>,
    pub forms: Vec<VisitForm>,
}

/// Row diagnostics from the last load, for console reporting.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub trip_rows: usize,
    pub form_rows: usize,
    pub skipped_trips: usize,
    pub skipped_forms: usize,
}

#[derive(Debug)]
struct CacheEntry {
    fetched_at: Instant,
    trips_csv: String,
    forms_csv: String,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

pub struct DataSource {
    kind: SourceKind,
    ttl: Duration,
    cache: Option<CacheEntry>,
}

impl DataSource {
    pub fn new(kind: SourceKind, ttl: Duration) -> Self {
        DataSource {
            kind,
            ttl,
            cache: None,
        }
    }

    /// Drop the cached remote copy so the next `load` refetches.
    pub fn refresh(&mut self) {
        self.cache = None;
    }

    /// Fetch (or serve from cache), validate both schemas, parse both sheets.
    pub fn load(&mut self) -> Result<(Dataset, LoadReport), ReportError> {
        let (trips_csv, forms_csv) = self.fetch_raw()?;
        check_schema(&trips_csv, TRIPS_SHEET, TRIPS_COLUMNS)?;
        check_schema(&forms_csv, FORMS_SHEET, FORMS_COLUMNS)?;

        let (trips, skipped_trips) = parse_trips(&trips_csv)?;
        let (forms, skipped_forms) = parse_forms(&forms_csv)?;
        if skipped_trips > 0 || skipped_forms > 0 {
            warn!(
                "skipped unparsable rows: {} trips, {} forms",
                skipped_trips, skipped_forms
            );
        }
        let report = LoadReport {
            trip_rows: trips.len(),
            form_rows: forms.len(),
            skipped_trips,
            skipped_forms,
        };
        Ok((Dataset { trips, forms }, report))
    }

    fn fetch_raw(&mut self) -> Result<(String, String), ReportError> {
        match &self.kind {
            SourceKind::LocalDir(dir) => {
                let read = |sheet: &str| -> Result<String, ReportError> {
                    let path = dir.join(format!("{}.csv", sheet));
                    std::fs::read_to_string(&path).map_err(|e| {
                        ReportError::SourceUnavailable(format!("{}: {}", path.display(), e))
                    })
                };
                Ok((read(TRIPS_SHEET)?, read(FORMS_SHEET)?))
            }
            SourceKind::RemoteSheet { document_id } => {
                if let Some(entry) = &self.cache {
                    if entry.is_fresh(self.ttl) {
                        info!("serving sheets from cache (document {})", document_id);
                        return Ok((entry.trips_csv.clone(), entry.forms_csv.clone()));
                    }
                }
                info!("fetching sheets for document {}", document_id);
                let trips_csv = fetch_sheet(document_id, TRIPS_SHEET)?;
                let forms_csv = fetch_sheet(document_id, FORMS_SHEET)?;
                self.cache = Some(CacheEntry {
                    fetched_at: Instant::now(),
                    trips_csv: trips_csv.clone(),
                    forms_csv: forms_csv.clone(),
                });
                Ok((trips_csv, forms_csv))
            }
        }
    }
}

fn fetch_sheet(document_id: &str, sheet: &str) -> Result<String, ReportError> {
    let url = format!(
        "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv&sheet={}",
        document_id, sheet
    );
    let resp = reqwest::blocking::get(&url)
        .map_err(|e| ReportError::SourceUnavailable(format!("{}: {}", sheet, e)))?;
    if !resp.status().is_success() {
        return Err(ReportError::SourceUnavailable(format!(
            "{}: HTTP {}",
            sheet,
            resp.status()
        )));
    }
    resp.text()
        .map_err(|e| ReportError::SourceUnavailable(format!("{}: {}", sheet, e)))
}

// Header validation runs before row deserialization so a missing column is
// reported by name instead of surfacing as per-row serde noise.
fn check_schema(csv_text: &str, sheet: &str, required: &[&str]) -> Result<(), ReportError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| ReportError::SourceUnavailable(format!("{}: {}", sheet, e)))?;
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(ReportError::SchemaMismatch {
                sheet: sheet.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn parse_trips(csv_text: &str) -> Result<(Vec<Trip>, usize), ReportError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let mut trips = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.deserialize::<RawTripRow>() {
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let date = match parse_date_safe(row.date.as_deref()) {
            Some(d) => d,
            None => {
                skipped += 1;
                continue;
            }
        };
        let distance_km = parse_f64_safe(row.distance_km.as_deref()).unwrap_or(0.0);
        let travel_time = row.travel_time.unwrap_or_default().trim().to_string();
        trips.push(Trip {
            date,
            distance_km,
            travel_time,
        });
    }
    Ok((trips, skipped))
}

fn parse_forms(csv_text: &str) -> Result<(Vec<VisitForm>, usize), ReportError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let mut forms = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.deserialize::<RawFormRow>() {
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let submitted_at = match parse_datetime_safe(row.submitted_at.as_deref()) {
            Some(ts) => ts,
            None => {
                skipped += 1;
                continue;
            }
        };
        let text = |v: Option<String>| v.unwrap_or_default().trim().to_string();
        let photo = row
            .photo
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        forms.push(VisitForm {
            submitted_at,
            employee: text(row.employee),
            client: text(row.client),
            form_name: text(row.form_name),
            form_type: text(row.form_type),
            address: text(row.address),
            contact_name: text(row.contact_name),
            activity: text(row.activity),
            visited: text(row.visited),
            notes: text(row.notes),
            photo,
            latitude: parse_f64_safe(row.latitude.as_deref()),
            longitude: parse_f64_safe(row.longitude.as_deref()),
        });
    }
    Ok((forms, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRIPS_CSV: &str = "\
FECHA,Distancia recorrida total km,Tiempo de viaje
2024-03-05,12.5,0:30:00
2024-03-06,not a number,0:20:00
bad date,3.0,0:10:00
";

    const FORMS_CSV: &str = "\
Fecha de llenar,Empleado,Tarea,Nombre de formulario,Tipo,Dirección de envío,¿Cuál es el nombre del Doctor/ la Clínica?,¿Qué actividades realizaste?,¿A quién visitaste?,Notas adicionales sobre la visita,Evidencia Fotográfica,Latitud,Longitud
2024-03-05 10:30:00,Ana,Clínica Norte,Visita,Visita médica,Av. Duarte 12,Dr. Pérez,Presentación,Dr. Pérez,,foto1.jpg,18.48,-69.91
2024-03-06,Beto,Clínica Sur,Visita,Entrega,,,Entrega de muestras,,,,,
";

    fn local_source(dir: &std::path::Path) -> DataSource {
        DataSource::new(
            SourceKind::LocalDir(dir.to_path_buf()),
            Duration::from_secs(3600),
        )
    }

    fn write_sheets(dir: &std::path::Path, trips: &str, forms: &str) {
        let mut f = std::fs::File::create(dir.join("VIAJES.csv")).unwrap();
        f.write_all(trips.as_bytes()).unwrap();
        let mut f = std::fs::File::create(dir.join("FORMULARIO.csv")).unwrap();
        f.write_all(forms.as_bytes()).unwrap();
    }

    #[test]
    fn loads_and_parses_both_sheets() {
        let dir = tempfile::tempdir().unwrap();
        write_sheets(dir.path(), TRIPS_CSV, FORMS_CSV);
        let (dataset, report) = local_source(dir.path()).load().unwrap();

        // Bad date row skipped; unparsable distance coerced to 0.
        assert_eq!(dataset.trips.len(), 2);
        assert_eq!(report.skipped_trips, 1);
        assert_eq!(dataset.trips[0].distance_km, 12.5);
        assert_eq!(dataset.trips[1].distance_km, 0.0);

        assert_eq!(dataset.forms.len(), 2);
        assert_eq!(report.skipped_forms, 0);
        let ana = &dataset.forms[0];
        assert_eq!(ana.employee, "Ana");
        assert_eq!(ana.photo.as_deref(), Some("foto1.jpg"));
        assert_eq!(ana.latitude, Some(18.48));
        // Bare-date submission parses as midnight, blank coords stay None.
        let beto = &dataset.forms[1];
        assert_eq!(beto.submitted_date().to_string(), "2024-03-06");
        assert_eq!(beto.latitude, None);
        assert_eq!(beto.photo, None);
    }

    #[test]
    fn missing_column_is_a_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let bad_trips = "FECHA,Tiempo de viaje\n2024-03-05,0:30:00\n";
        write_sheets(dir.path(), bad_trips, FORMS_CSV);
        let err = local_source(dir.path()).load().unwrap_err();
        match err {
            ReportError::SchemaMismatch { sheet, column } => {
                assert_eq!(sheet, "VIAJES");
                assert_eq!(column, "Distancia recorrida total km");
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = local_source(dir.path()).load().unwrap_err();
        assert!(matches!(err, ReportError::SourceUnavailable(_)));
    }

    #[test]
    fn cache_entry_expires_with_ttl() {
        let entry = CacheEntry {
            fetched_at: Instant::now(),
            trips_csv: String::new(),
            forms_csv: String::new(),
        };
        assert!(entry.is_fresh(Duration::from_secs(3600)));
        assert!(!entry.is_fresh(Duration::ZERO));
    }

    #[test]
    fn refresh_drops_the_cache() {
        let mut source = DataSource::new(
            SourceKind::RemoteSheet {
                document_id: "doc123".to_string(),
            },
            Duration::from_secs(3600),
        );
        source.cache = Some(CacheEntry {
            fetched_at: Instant::now(),
            trips_csv: TRIPS_CSV.to_string(),
            forms_csv: FORMS_CSV.to_string(),
        });
        // A fresh cache is served without touching the network.
        let (dataset, _) = source.load().unwrap();
        assert_eq!(dataset.trips.len(), 2);
        source.refresh();
        assert!(source.cache.is_none());
    }
}
