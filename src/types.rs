use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

// Raw rows exactly as the spreadsheet export names them. Everything is an
// optional string; parsing into typed values happens in the source adapter.

#[derive(Debug, Deserialize)]
pub struct RawTripRow {
    #[serde(rename = "FECHA")]
    pub date: Option<String>,
    #[serde(rename = "Distancia recorrida total km")]
    pub distance_km: Option<String>,
    #[serde(rename = "Tiempo de viaje")]
    pub travel_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawFormRow {
    #[serde(rename = "Fecha de llenar")]
    pub submitted_at: Option<String>,
    #[serde(rename = "Empleado")]
    pub employee: Option<String>,
    #[serde(rename = "Tarea")]
    pub client: Option<String>,
    #[serde(rename = "Nombre de formulario")]
    pub form_name: Option<String>,
    #[serde(rename = "Tipo")]
    pub form_type: Option<String>,
    #[serde(rename = "Dirección de envío")]
    pub address: Option<String>,
    #[serde(rename = "¿Cuál es el nombre del Doctor/ la Clínica?")]
    pub contact_name: Option<String>,
    #[serde(rename = "¿Qué actividades realizaste?")]
    pub activity: Option<String>,
    #[serde(rename = "¿A quién visitaste?")]
    pub visited: Option<String>,
    #[serde(rename = "Notas adicionales sobre la visita")]
    pub notes: Option<String>,
    #[serde(rename = "Evidencia Fotográfica")]
    pub photo: Option<String>,
    #[serde(rename = "Latitud")]
    pub latitude: Option<String>,
    #[serde(rename = "Longitud")]
    pub longitude: Option<String>,
}

/// One logged vehicle movement from the VIAJES sheet.
///
/// `travel_time` stays in its raw string form; the aggregation layer parses
/// it on demand and coerces unparsable values to a zero duration.
#[derive(Debug, Clone)]
pub struct Trip {
    pub date: NaiveDate,
    pub distance_km: f64,
    pub travel_time: String,
}

/// One field-visit report from the FORMULARIO sheet.
#[derive(Debug, Clone)]
pub struct VisitForm {
    pub submitted_at: NaiveDateTime,
    pub employee: String,
    /// The "Tarea" column: the client the visit was logged against.
    pub client: String,
    pub form_name: String,
    pub form_type: String,
    pub address: String,
    pub contact_name: String,
    pub activity: String,
    pub visited: String,
    pub notes: String,
    pub photo: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl VisitForm {
    /// Calendar-day projection of `submitted_at`. Always derived, never
    /// stored, so it cannot drift out of sync after filtering.
    pub fn submitted_date(&self) -> NaiveDate {
        self.submitted_at.date()
    }
}

// Console table rows for the view layer.

#[derive(Debug, Tabled, Clone)]
pub struct CountByDayRow {
    #[tabled(rename = "Fecha")]
    pub date: NaiveDate,
    #[tabled(rename = "Cantidad")]
    pub count: usize,
}

#[derive(Debug, Tabled, Clone, PartialEq)]
pub struct CountByKeyRow {
    #[tabled(rename = "Nombre")]
    pub key: String,
    #[tabled(rename = "Cantidad")]
    pub count: usize,
}

#[derive(Debug, Tabled, Clone)]
pub struct RankingRow {
    #[tabled(rename = "Puesto")]
    pub rank: usize,
    #[tabled(rename = "Empleado")]
    pub employee: String,
    #[tabled(rename = "Formularios")]
    pub forms: usize,
}

// Chart and map specifications handed to whatever renderer the shell uses.
// They carry data only; drawing is a collaborator concern.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    /// Popup text: `"<client> - <submitted date>"`.
    pub label: String,
}

/// Point markers plus the heat-layer sample list over every form that has
/// both coordinates. Forms missing either coordinate are excluded upstream.
#[derive(Debug, Clone, Serialize)]
pub struct MapSpec {
    pub markers: Vec<Marker>,
    pub heat: Vec<[f64; 2]>,
}

/// Outcome of resolving a form's photo reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoStatus {
    /// No photo reference on the record.
    None,
    /// A local file that exists under the photo base directory.
    Local(String),
    /// An http(s) reference, passed through untouched.
    Remote(String),
    /// The reference points at a local file that does not exist. Recovered
    /// inline with a warning; never fails the view.
    NotFound(String),
}

/// Automatic alerts, evaluated for weekly windows only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// Less than 10 km driven in the week.
    LowDistance,
    /// Fewer than 2 forms submitted in the week.
    LowActivity,
}
