use std::fmt;

use crate::adapter::{Row, Value};
use crate::domain::{Cadence, KeplerId, KoiNumber};
use crate::error::KplrError;
use crate::resolve::Related;

pub trait Record: Sized {
    const KIND: &'static str;

    fn from_row(row: Row) -> Self;

    fn row(&self) -> &Row;

    fn natural_key(&self) -> String;

    fn get(&self, field: &str) -> Option<&Value> {
        self.row().get(field)
    }
}

pub trait KeplerTarget {
    fn kepler_id(&self) -> Result<KeplerId, KplrError>;
}

fn kepler_id_field(
    value: Option<i64>,
    record: &'static str,
    field: &'static str,
) -> Result<KeplerId, KplrError> {
    let value = value.ok_or(KplrError::MissingField { record, field })?;
    KeplerId::try_from(value)
}

macro_rules! record_display {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "<{}({})>", <$ty as Record>::KIND, self.natural_key())
            }
        }
    };
}

#[derive(Debug, Clone)]
pub struct Koi {
    pub kepid: Option<i64>,
    pub kepoi_name: Option<String>,
    pub kepler_name: Option<String>,
    pub koi_disposition: Option<String>,
    pub koi_pdisposition: Option<String>,
    pub koi_score: Option<f64>,
    pub koi_period: Option<f64>,
    pub koi_period_err1: Option<f64>,
    pub koi_period_err2: Option<f64>,
    pub koi_time0bk: Option<f64>,
    pub koi_impact: Option<f64>,
    pub koi_duration: Option<f64>,
    pub koi_depth: Option<f64>,
    pub koi_prad: Option<f64>,
    pub koi_teq: Option<f64>,
    pub koi_insol: Option<f64>,
    pub koi_model_snr: Option<f64>,
    pub koi_steff: Option<f64>,
    pub koi_slogg: Option<f64>,
    pub koi_srad: Option<f64>,
    pub koi_kepmag: Option<f64>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    row: Row,
    pub(crate) star: Related<Star>,
}

impl Record for Koi {
    const KIND: &'static str = "KOI";

    fn from_row(row: Row) -> Self {
        Self {
            kepid: row.int("kepid"),
            kepoi_name: row.text("kepoi_name"),
            kepler_name: row.text("kepler_name"),
            koi_disposition: row.text("koi_disposition"),
            koi_pdisposition: row.text("koi_pdisposition"),
            koi_score: row.float("koi_score"),
            koi_period: row.float("koi_period"),
            koi_period_err1: row.float("koi_period_err1"),
            koi_period_err2: row.float("koi_period_err2"),
            koi_time0bk: row.float("koi_time0bk"),
            koi_impact: row.float("koi_impact"),
            koi_duration: row.float("koi_duration"),
            koi_depth: row.float("koi_depth"),
            koi_prad: row.float("koi_prad"),
            koi_teq: row.float("koi_teq"),
            koi_insol: row.float("koi_insol"),
            koi_model_snr: row.float("koi_model_snr"),
            koi_steff: row.float("koi_steff"),
            koi_slogg: row.float("koi_slogg"),
            koi_srad: row.float("koi_srad"),
            koi_kepmag: row.float("koi_kepmag"),
            ra: row.float("ra"),
            dec: row.float("dec"),
            row,
            star: Related::default(),
        }
    }

    fn row(&self) -> &Row {
        &self.row
    }

    fn natural_key(&self) -> String {
        format!("\"{}\"", self.kepoi_name.as_deref().unwrap_or_default())
    }
}

impl KeplerTarget for Koi {
    fn kepler_id(&self) -> Result<KeplerId, KplrError> {
        kepler_id_field(self.kepid, Self::KIND, "kepid")
    }
}

record_display!(Koi);

#[derive(Debug, Clone)]
pub struct Planet {
    pub kepler_name: Option<String>,
    pub kepid: Option<i64>,
    pub kepoi_name: Option<String>,
    pub koi_number: Option<String>,
    pub alt_name: Option<String>,
    pub degree_ra: Option<f64>,
    pub degree_dec: Option<f64>,
    pub koi_period: Option<f64>,
    pub koi_prad: Option<f64>,
    pub koi_teq: Option<i64>,
    pub koi_duration: Option<f64>,
    pub koi_depth: Option<f64>,
    pub koi_incl: Option<f64>,
    pub koi_sma: Option<f64>,
    pub koi_steff: Option<i64>,
    pub koi_srad: Option<f64>,
    pub koi_smass: Option<f64>,
    pub koi_vet_date: Option<String>,
    row: Row,
    pub(crate) koi: Related<Koi>,
    pub(crate) star: Related<Star>,
}

impl Planet {
    pub fn koi_id(&self) -> Result<KoiNumber, KplrError> {
        self.koi_number
            .as_deref()
            .ok_or(KplrError::MissingField {
                record: Self::KIND,
                field: "koi_number",
            })?
            .parse()
    }
}

impl Record for Planet {
    const KIND: &'static str = "Planet";

    fn from_row(row: Row) -> Self {
        Self {
            kepler_name: row.text("kepler_name"),
            kepid: row.int("kepid"),
            kepoi_name: row.text("kepoi_name"),
            koi_number: row.text("koi_number"),
            alt_name: row.text("alt_name"),
            degree_ra: row.float("degree_ra"),
            degree_dec: row.float("degree_dec"),
            koi_period: row.float("koi_period"),
            koi_prad: row.float("koi_prad"),
            koi_teq: row.int("koi_teq"),
            koi_duration: row.float("koi_duration"),
            koi_depth: row.float("koi_depth"),
            koi_incl: row.float("koi_incl"),
            koi_sma: row.float("koi_sma"),
            koi_steff: row.int("koi_steff"),
            koi_srad: row.float("koi_srad"),
            koi_smass: row.float("koi_smass"),
            koi_vet_date: row.text("koi_vet_date"),
            row,
            koi: Related::default(),
            star: Related::default(),
        }
    }

    fn row(&self) -> &Row {
        &self.row
    }

    fn natural_key(&self) -> String {
        format!("\"{}\"", self.kepler_name.as_deref().unwrap_or_default())
    }
}

impl KeplerTarget for Planet {
    fn kepler_id(&self) -> Result<KeplerId, KplrError> {
        kepler_id_field(self.kepid, Self::KIND, "kepid")
    }
}

record_display!(Planet);

#[derive(Debug, Clone)]
pub struct Star {
    pub kic_kepler_id: Option<i64>,
    /// Same value as `kic_kepler_id`, under the name the other tables use.
    pub kepid: Option<i64>,
    pub kic_degree_ra: Option<f64>,
    pub kic_dec: Option<f64>,
    pub kic_kepmag: Option<f64>,
    pub kic_teff: Option<i64>,
    pub kic_logg: Option<f64>,
    pub kic_feh: Option<f64>,
    pub kic_radius: Option<f64>,
    pub kic_pmra: Option<f64>,
    pub kic_pmdec: Option<f64>,
    pub kic_2mass_id: Option<String>,
    row: Row,
    pub(crate) kois: Related<Vec<Koi>>,
}

impl Record for Star {
    const KIND: &'static str = "Star";

    fn from_row(row: Row) -> Self {
        let kic_kepler_id = row.int("kic_kepler_id");
        Self {
            kic_kepler_id,
            kepid: kic_kepler_id,
            kic_degree_ra: row.float("kic_degree_ra"),
            kic_dec: row.float("kic_dec"),
            kic_kepmag: row.float("kic_kepmag"),
            kic_teff: row.int("kic_teff"),
            kic_logg: row.float("kic_logg"),
            kic_feh: row.float("kic_feh"),
            kic_radius: row.float("kic_radius"),
            kic_pmra: row.float("kic_pmra"),
            kic_pmdec: row.float("kic_pmdec"),
            kic_2mass_id: row.text("kic_2mass_id"),
            row,
            kois: Related::default(),
        }
    }

    fn row(&self) -> &Row {
        &self.row
    }

    fn natural_key(&self) -> String {
        self.kic_kepler_id
            .map(|id| id.to_string())
            .unwrap_or_default()
    }
}

impl KeplerTarget for Star {
    fn kepler_id(&self) -> Result<KeplerId, KplrError> {
        kepler_id_field(self.kic_kepler_id, Self::KIND, "kic_kepler_id")
    }
}

record_display!(Star);

#[derive(Debug, Clone)]
pub struct Dataset {
    pub ktc_kepler_id: Option<i64>,
    pub sci_data_set_name: Option<String>,
    pub ktc_target_type: Option<String>,
    pub ktc_investigation_id: Option<String>,
    pub sci_data_quarter: Option<i64>,
    pub sci_data_rel: Option<i64>,
    pub sci_archive_class: Option<String>,
    pub sci_start_time: Option<String>,
    pub sci_end_time: Option<String>,
    pub sci_release_date: Option<String>,
    pub sci_ra: Option<f64>,
    pub sci_dec: Option<f64>,
    row: Row,
}

impl Dataset {
    pub fn dataset_name(&self) -> Result<&str, KplrError> {
        self.sci_data_set_name
            .as_deref()
            .ok_or(KplrError::MissingField {
                record: Self::KIND,
                field: "sci_data_set_name",
            })
    }

    pub fn cadence(&self) -> Result<Cadence, KplrError> {
        self.ktc_target_type
            .as_deref()
            .map(Cadence::from_target_type)
            .ok_or(KplrError::MissingField {
                record: Self::KIND,
                field: "ktc_target_type",
            })
    }
}

impl Record for Dataset {
    const KIND: &'static str = "Dataset";

    fn from_row(row: Row) -> Self {
        Self {
            ktc_kepler_id: row.int("ktc_kepler_id"),
            sci_data_set_name: row.text("sci_data_set_name"),
            ktc_target_type: row.text("ktc_target_type"),
            ktc_investigation_id: row.text("ktc_investigation_id"),
            sci_data_quarter: row.int("sci_data_quarter"),
            sci_data_rel: row.int("sci_data_rel"),
            sci_archive_class: row.text("sci_archive_class"),
            sci_start_time: row.text("sci_start_time"),
            sci_end_time: row.text("sci_end_time"),
            sci_release_date: row.text("sci_release_date"),
            sci_ra: row.float("sci_ra"),
            sci_dec: row.float("sci_dec"),
            row,
        }
    }

    fn row(&self) -> &Row {
        &self.row
    }

    fn natural_key(&self) -> String {
        format!(
            "\"{}_{}\"",
            self.sci_data_set_name.as_deref().unwrap_or_default(),
            self.ktc_target_type.as_deref().unwrap_or_default()
        )
    }
}

impl KeplerTarget for Dataset {
    fn kepler_id(&self) -> Result<KeplerId, KplrError> {
        kepler_id_field(self.ktc_kepler_id, Self::KIND, "ktc_kepler_id")
    }
}

record_display!(Dataset);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::munge;

    #[test]
    fn koi_keeps_every_field() {
        let row = munge([
            ("kepid", "11446443"),
            ("kepoi_name", "K00001.01"),
            ("koi_period", "2.47061317"),
            ("koi_vet_stat", "Done"),
        ]);
        let koi = Koi::from_row(row);
        assert_eq!(koi.kepid, Some(11446443));
        assert_eq!(koi.koi_period, Some(2.47061317));
        assert_eq!(koi.koi_prad, None);
        assert_eq!(
            koi.get("koi_vet_stat"),
            Some(&Value::Text("Done".to_string()))
        );
        assert!(koi.get("koi_prad").is_none());
        assert_eq!(koi.to_string(), "<KOI(\"K00001.01\")>");
    }

    #[test]
    fn star_mirrors_kepid() {
        let star = Star::from_row(munge([("kic_kepler_id", "9787239")]));
        assert_eq!(star.kepid, Some(9787239));
        assert_eq!(star.kepler_id().unwrap(), KeplerId::new(9787239));
        assert_eq!(star.to_string(), "<Star(9787239)>");
    }

    #[test]
    fn planet_koi_number_parses() {
        let mut row = Row::new();
        row.insert("kepler_name", Value::Text("Kepler-32 f".to_string()));
        row.insert("koi_number", Value::Text("952.05".to_string()));
        let planet = Planet::from_row(row);
        assert_eq!(planet.koi_id().unwrap().kepoi_name(), "K00952.05");
        assert_eq!(planet.to_string(), "<Planet(\"Kepler-32 f\")>");
    }

    #[test]
    fn missing_kepid_is_reported() {
        let koi = Koi::from_row(Row::new());
        let err = koi.kepler_id().unwrap_err();
        assert!(matches!(
            err,
            KplrError::MissingField {
                field: "kepid",
                ..
            }
        ));
    }
}
