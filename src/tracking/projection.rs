use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::shipment::Shipment;
use crate::tracking::status::{derive_status, is_departure_planned, Status};

/// Shipment annotated with its derived status, ready to be listed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedShipment {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub status: Status,
    pub planned_departure: bool,
    pub editable: bool,
}

impl TrackedShipment {
    pub fn new(shipment: Shipment, now: DateTime<Utc>) -> Self {
        let status = derive_status(&shipment, now);
        let planned_departure = is_departure_planned(&shipment, now);
        Self {
            shipment,
            status,
            planned_departure,
            editable: status.is_editable(),
        }
    }
}

/// Derive the status of every shipment against the same instant
pub fn annotate(shipments: Vec<Shipment>, now: DateTime<Utc>) -> Vec<TrackedShipment> {
    shipments
        .into_iter()
        .map(|shipment| TrackedShipment::new(shipment, now))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    NotDeparted,
    InTransit,
    Delivered,
}

impl StatusFilter {
    fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::NotDeparted => status == Status::NotDeparted,
            StatusFilter::InTransit => status == Status::InTransit,
            StatusFilter::Delivered => status == Status::Delivered,
        }
    }
}

/// Exact-id filter where the sentinel `all` (or an empty value) disables filtering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IdFilter {
    #[default]
    All,
    Only(String),
}

impl IdFilter {
    fn matches(&self, id: &str) -> bool {
        match self {
            IdFilter::All => true,
            IdFilter::Only(expected) => expected == id,
        }
    }
}

impl From<String> for IdFilter {
    fn from(value: String) -> Self {
        if value.is_empty() || value == "all" {
            IdFilter::All
        } else {
            IdFilter::Only(value)
        }
    }
}

impl From<IdFilter> for String {
    fn from(filter: IdFilter) -> Self {
        match filter {
            IdFilter::All => "all".to_string(),
            IdFilter::Only(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreationDate,
    DepartureDate,
    ArrivalDate,
    Status,
    ClientName,
    CarrierName,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// View parameters of the shipment list. Deserializes from the query string
/// `search`, `status`, `client`, `carrier`, `sort` and `direction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    pub search: String,
    pub status: StatusFilter,
    pub client: IdFilter,
    pub carrier: IdFilter,
    pub sort: SortKey,
    pub direction: SortDirection,
}

/// Filter then sort the shipments for display.
///
/// All filters must pass. The sort is stable in both directions, so shipments
/// with equal keys keep the order they had in `shipments`.
pub fn project(shipments: &[TrackedShipment], params: &ProjectionParams) -> Vec<TrackedShipment> {
    let needle = params.search.to_lowercase();

    let mut keyed: Vec<(SortValue, TrackedShipment)> = shipments
        .iter()
        .filter(|tracked| matches_search(&tracked.shipment, &needle))
        .filter(|tracked| params.status.matches(tracked.status))
        .filter(|tracked| params.client.matches(&tracked.shipment.client_id))
        .filter(|tracked| params.carrier.matches(&tracked.shipment.carrier_id))
        .map(|tracked| (SortValue::of(tracked, params.sort), tracked.clone()))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match params.direction {
        SortDirection::Asc => a.cmp(b),
        SortDirection::Desc => a.cmp(b).reverse(),
    });

    keyed.into_iter().map(|(_, tracked)| tracked).collect()
}

fn matches_search(shipment: &Shipment, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    shipment
        .name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(needle))
        || shipment.id.to_lowercase().contains(needle)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Created(DateTime<Utc>),
    /// Milliseconds since the epoch; missing dates sort as the epoch.
    Date(i64),
    Rank(u8),
    Name(NameKey),
}

impl SortValue {
    fn of(tracked: &TrackedShipment, key: SortKey) -> Self {
        let shipment = &tracked.shipment;
        match key {
            SortKey::CreationDate => SortValue::Created(shipment.created_at),
            SortKey::DepartureDate => SortValue::Date(date_key(shipment.departure_date)),
            SortKey::ArrivalDate => SortValue::Date(date_key(shipment.arrival_date)),
            SortKey::Status => SortValue::Rank(tracked.status.rank()),
            SortKey::ClientName => SortValue::Name(NameKey::new(shipment.client_name())),
            SortKey::CarrierName => SortValue::Name(NameKey::new(shipment.carrier_name())),
        }
    }
}

fn date_key(date: Option<DateTime<Utc>>) -> i64 {
    date.map(|d| d.timestamp_millis()).unwrap_or(0)
}

/// Locale-style name ordering: accents and case only break ties.
/// Field order is comparison order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct NameKey {
    folded: String,
    lower: String,
    raw: String,
}

impl NameKey {
    fn new(name: &str) -> Self {
        Self {
            folded: fold_accents(name),
            lower: name.to_lowercase(),
            raw: name.to_string(),
        }
    }
}

fn fold_accents(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => folded.push('a'),
            'ç' => folded.push('c'),
            'è' | 'é' | 'ê' | 'ë' => folded.push('e'),
            'ì' | 'í' | 'î' | 'ï' => folded.push('i'),
            'ñ' => folded.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => folded.push('o'),
            'ù' | 'ú' | 'û' | 'ü' => folded.push('u'),
            'ý' | 'ÿ' => folded.push('y'),
            'æ' => folded.push_str("ae"),
            'œ' => folded.push_str("oe"),
            'ß' => folded.push_str("ss"),
            other => folded.push(other),
        }
    }
    folded
}
