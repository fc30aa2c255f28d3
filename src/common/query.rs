// src/common/query.rs
//
// Helpers para os filtros de listagem vindos da query string.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Formulários mandam `?campo=` vazio; tratamos como ausente.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s).map_err(de::Error::custom).map(Some),
    }
}

// Filtro de responsável: um ID ou "unassigned" (sem responsável)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeFilter {
    Unassigned,
    User(i32),
}

impl FromStr for AssigneeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "unassigned" {
            return Ok(AssigneeFilter::Unassigned);
        }
        s.parse::<i32>()
            .map(AssigneeFilter::User)
            .map_err(|_| format!("responsável inválido: '{}'", s))
    }
}

/// Início do dia (00:00:00 UTC).
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Fim do dia (23:59:59 UTC), inclusivo.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    date.and_time(end).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[derive(Debug, Deserialize)]
    struct Filters {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        assigned_to_id: Option<AssigneeFilter>,
        #[serde(default, deserialize_with = "empty_string_as_none")]
        start_date: Option<NaiveDate>,
    }

    fn parse(json: &str) -> Filters {
        serde_json::from_str(json).expect("filters")
    }

    #[test]
    fn empty_values_are_ignored() {
        let f = parse(r#"{"assigned_to_id": "", "start_date": ""}"#);
        assert_eq!(f.assigned_to_id, None);
        assert_eq!(f.start_date, None);

        let f = parse("{}");
        assert_eq!(f.assigned_to_id, None);
    }

    #[test]
    fn assignee_accepts_id_or_unassigned() {
        let f = parse(r#"{"assigned_to_id": "unassigned"}"#);
        assert_eq!(f.assigned_to_id, Some(AssigneeFilter::Unassigned));

        let f = parse(r#"{"assigned_to_id": "7", "start_date": "2025-08-16"}"#);
        assert_eq!(f.assigned_to_id, Some(AssigneeFilter::User(7)));
        assert_eq!(f.start_date, NaiveDate::from_ymd_opt(2025, 8, 16));

        assert!(serde_json::from_str::<Filters>(r#"{"assigned_to_id": "ninguem"}"#).is_err());
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let day = NaiveDate::from_ymd_opt(2025, 8, 16).unwrap();
        let start = start_of_day(day);
        let end = end_of_day(day);
        assert_eq!((start.hour(), start.minute(), start.second()), (0, 0, 0));
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
        assert_eq!(end.date_naive(), day);
    }
}
