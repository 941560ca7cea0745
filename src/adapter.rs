use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value as Json};
use tracing::debug;

use FieldKind::{Float, Int, Text};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => write!(f, "{value}"),
            Value::Null => Ok(()),
        }
    }
}

pub fn coerce(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Value::Int(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return Value::Float(value);
    }
    Value::Text(raw.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub fn munge<I, K, V>(raw: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    raw.into_iter()
        .map(|(key, value)| (key.into(), coerce(value.as_ref())))
        .collect()
}

pub fn munge_json(object: &Map<String, Json>) -> Row {
    object
        .iter()
        .map(|(key, value)| (key.clone(), json_cell(value)))
        .collect()
}

fn json_cell(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::String(text) => coerce(text),
        Json::Number(number) => number
            .as_i64()
            .map(Value::Int)
            .or_else(|| number.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        Json::Bool(flag) => Value::Text(flag.to_string()),
        other => Value::Text(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub source: &'static str,
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(source: &'static str, name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { source, name, kind }
}

#[derive(Debug, Clone, Copy)]
pub struct Adapter {
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Adapter {
    pub fn field(&self, source: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.source == source)
    }

    pub fn adapt(&self, object: &Map<String, Json>) -> Row {
        let mut row = Row::new();
        for (key, value) in object {
            match self.field(key) {
                Some(spec) => row.insert(spec.name, typed_cell(value, spec.kind)),
                None => debug!(table = self.table, column = %key, "dropping undeclared column"),
            }
        }
        row
    }
}

fn typed_cell(value: &Json, kind: FieldKind) -> Value {
    let raw = match value {
        Json::Null => return Value::Null,
        Json::String(text) => text.trim().to_string(),
        other => other.to_string(),
    };
    if raw.is_empty() {
        return Value::Null;
    }
    match kind {
        FieldKind::Int => raw
            .parse::<i64>()
            .ok()
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|number| number.fract() == 0.0)
                    .map(|number| number as i64)
            })
            .map(Value::Int)
            .unwrap_or(Value::Null),
        FieldKind::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::Null),
        FieldKind::Text => Value::Text(raw),
    }
}

pub const PLANET_ADAPTER: Adapter = Adapter {
    table: "confirmed_planets",
    fields: &[
        field("Planet Name", "kepler_name", Text),
        field("Kepler ID", "kepid", Int),
        field("KOI Name", "kepoi_name", Text),
        field("Alt Name", "alt_name", Text),
        field("KOI Number", "koi_number", Text),
        field("RA (J2000)", "degree_ra", Float),
        field("RA Error", "ra_err", Float),
        field("Dec (J2000)", "degree_dec", Float),
        field("Dec Error", "dec_err", Float),
        field("2mass Name", "tm_designation", Text),
        field("Planet temp", "koi_teq", Int),
        field("Planet Radius", "koi_prad", Float),
        field("Transit duration", "koi_duration", Float),
        field("Period", "koi_period", Float),
        field("Period err1", "koi_period_err1", Float),
        field("Ingress Duration", "koi_ingress", Float),
        field("Impact Parameter", "koi_impact", Float),
        field("Inclination", "koi_incl", Float),
        field("Provenance", "koi_sparprov", Text),
        field("a/R", "koi_dor", Float),
        field("Transit Number", "koi_num_transits", Int),
        field("Transit Model", "koi_trans_mod", Text),
        field("Time of transit", "koi_time0bk", Float),
        field("Time of transit err1", "koi_time0bk_err1", Float),
        field("Transit Depth", "koi_depth", Float),
        field("Semi-major Axis", "koi_sma", Float),
        field("r/R", "koi_ror", Float),
        field("r/R err1", "koi_ror_err1", Float),
        field("Age", "koi_sage", Float),
        field("Metallicity", "koi_smet", Float),
        field("Stellar Mass", "koi_smass", Float),
        field("Stellar Radius", "koi_srad", Float),
        field("Stellar Teff", "koi_steff", Int),
        field("Logg", "koi_slogg", Float),
        field("KEP Mag", "koi_kepmag", Float),
        field("g Mag", "koi_gmag", Float),
        field("r Mag", "koi_rmag", Float),
        field("i Mag", "koi_imag", Float),
        field("z Mag", "koi_zmag", Float),
        field("J Mag", "koi_jmag", Float),
        field("H Mag", "koi_hmag", Float),
        field("K Mag", "koi_kmag", Float),
        field("KOI List", "koi_list_flag", Text),
        field("Last Update", "koi_vet_date", Text),
    ],
};

pub const STAR_ADAPTER: Adapter = Adapter {
    table: "kic10",
    fields: &[
        field("Kepler ID", "kic_kepler_id", Int),
        field("RA (J2000)", "kic_degree_ra", Float),
        field("Dec (J2000)", "kic_dec", Float),
        field("RA PM (arcsec/yr)", "kic_pmra", Float),
        field("Dec PM (arcsec/yr)", "kic_pmdec", Float),
        field("u Mag", "kic_umag", Float),
        field("g Mag", "kic_gmag", Float),
        field("r Mag", "kic_rmag", Float),
        field("i Mag", "kic_imag", Float),
        field("z Mag", "kic_zmag", Float),
        field("Gred Mag", "kic_gredmag", Float),
        field("D51 Mag", "kic_d51mag", Float),
        field("J Mag", "kic_jmag", Float),
        field("H Mag", "kic_hmag", Float),
        field("K Mag", "kic_kmag", Float),
        field("Kepler Mag", "kic_kepmag", Float),
        field("2MASS ID", "kic_2mass_id", Text),
        field("2MASS Designation", "kic_tmid", Int),
        field("SCP ID", "kic_scpid", Int),
        field("Alt ID", "kic_altid", Int),
        field("Alt ID Source", "kic_altsource", Int),
        field("Star/Gal ID", "kic_galaxy", Int),
        field("Isolated/Blend ID", "kic_blend", Int),
        field("Var. ID", "kic_variable", Int),
        field("Teff (deg K)", "kic_teff", Int),
        field("Log G (cm/s/s)", "kic_logg", Float),
        field("Metallicity (solar=0.0)", "kic_feh", Float),
        field("E(B-V)", "kic_ebminusv", Float),
        field("A_V", "kic_av", Float),
        field("Radius (solar=1.0)", "kic_radius", Float),
        field("Kepmag Source", "kic_cq", Text),
        field("Photometry Qual", "kic_pq", Int),
        field("Astrophysics Qual", "kic_aq", Int),
        field("Catalog key", "kic_catkey", Int),
        field("Scp Key", "kic_scpkey", Int),
        field("Parallax (arcsec)", "kic_parallax", Float),
        field("Gal Lon (deg)", "kic_glon", Float),
        field("Gal Lat (deg)", "kic_glat", Float),
        field("Total PM (arcsec/yr)", "kic_pmtotal", Float),
        field("g-r color", "kic_grcolor", Float),
        field("J-K color", "kic_jkcolor", Float),
        field("g-K color", "kic_gkcolor", Float),
        field("RA hours (J2000)", "kic_ra", Float),
    ],
};

pub const DATASET_ADAPTER: Adapter = Adapter {
    table: "data_search",
    fields: &[
        field("Kepler ID", "ktc_kepler_id", Int),
        field("Investigation ID", "ktc_investigation_id", Text),
        field("Pep ID", "sci_pep_id", Int),
        field("Dataset Name", "sci_data_set_name", Text),
        field("Quarter", "sci_data_quarter", Int),
        field("Data Release", "sci_data_rel", Int),
        field("RA (J2000)", "sci_ra", Float),
        field("Dec (J2000)", "sci_dec", Float),
        field("Target Type", "ktc_target_type", Text),
        field("Archive Class", "sci_archive_class", Text),
        field("Ref", "refnum", Int),
        field("Actual Start Time", "sci_start_time", Text),
        field("Actual End Time", "sci_end_time", Text),
        field("Release Date", "sci_release_date", Text),
        field("RA PM", "kic_pmra", Float),
        field("Dec PM", "kic_pmdec", Float),
        field("KEP Mag", "kic_kepmag", Float),
        field("Teff", "kic_teff", Int),
        field("Log G", "kic_logg", Float),
        field("Metallicity", "kic_feh", Float),
        field("Radius", "kic_radius", Float),
        field("Processing Date", "sci_generation_date", Text),
        field("crowding", "sci_crowdsap", Float),
        field("contamination", "sci_contamination", Float),
        field("flux fraction", "sci_flfrcsap", Float),
        field("cdpp3", "sci_Cdpp3_0", Float),
        field("cdpp6", "sci_Cdpp6_0", Float),
        field("cdpp12", "sci_Cdpp12_0", Float),
        field("Module", "sci_module", Int),
        field("Output", "sci_output", Int),
        field("Channel", "sci_channel", Int),
        field("Skygroup_ID", "sci_skygroup_id", Int),
        field("Condition flag", "condition_flag", Text),
    ],
};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn coerce_prefers_integers() {
        assert_eq!(coerce("666"), Value::Int(666));
        assert_eq!(coerce("-3"), Value::Int(-3));
    }

    #[test]
    fn coerce_falls_back_to_float_then_text() {
        assert_eq!(coerce("66.6"), Value::Float(66.6));
        assert_eq!(coerce("1e3"), Value::Float(1000.0));
        assert_eq!(coerce("value"), Value::Text("value".to_string()));
    }

    #[test]
    fn coerce_empty_is_null() {
        assert_eq!(coerce(""), Value::Null);
    }

    #[test]
    fn coerce_ignores_surrounding_whitespace_for_numbers() {
        assert_eq!(coerce(" 5"), Value::Int(5));
        assert_eq!(coerce("8.88\t"), Value::Float(8.88));
        assert_eq!(coerce(" CANDIDATE "), Value::Text(" CANDIDATE ".to_string()));
    }

    #[test]
    fn munge_keeps_every_key() {
        let row = munge([("kepid", "757450"), ("koi_period", "8.88"), ("note", "")]);
        assert_eq!(row.len(), 3);
        assert_eq!(row.int("kepid"), Some(757450));
        assert_eq!(row.float("koi_period"), Some(8.88));
        assert_eq!(row.get("note"), Some(&Value::Null));
        assert_eq!(row.text("note"), None);
    }

    #[test]
    fn adapter_renames_and_types() {
        let object = json!({
            "Kepler ID": "9787239",
            "Planet Name": "Kepler-32 f",
            "Period": "0.74296",
            "Planet temp": "",
            "Unlisted": "x"
        });
        let row = PLANET_ADAPTER.adapt(object.as_object().unwrap());
        assert_eq!(row.int("kepid"), Some(9787239));
        assert_eq!(row.text("kepler_name").as_deref(), Some("Kepler-32 f"));
        assert_eq!(row.float("koi_period"), Some(0.74296));
        assert_eq!(row.get("koi_teq"), Some(&Value::Null));
        assert!(!row.contains("Unlisted"));
        assert!(!row.contains("koi_prad"));
    }

    #[test]
    fn adapter_nulls_unparseable_numbers() {
        let object = json!({ "Teff (deg K)": "hot", "Kepler ID": 757450 });
        let row = STAR_ADAPTER.adapt(object.as_object().unwrap());
        assert_eq!(row.get("kic_teff"), Some(&Value::Null));
        assert_eq!(row.int("kic_kepler_id"), Some(757450));
    }

    #[test]
    fn munge_json_keeps_number_types() {
        let object = json!({ "a": 1, "b": 2.5, "c": "3", "d": null });
        let row = munge_json(object.as_object().unwrap());
        assert_eq!(row.int("a"), Some(1));
        assert_eq!(row.float("b"), Some(2.5));
        assert_eq!(row.int("c"), Some(3));
        assert_eq!(row.get("d"), Some(&Value::Null));
    }
}
