//! Dates command: list days with recorded activity.

use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use nat_core::AggregationService;
use nat_db::SessionStore;

pub fn format_dates(dates: &[NaiveDate]) -> String {
    let mut output = String::new();
    if dates.is_empty() {
        writeln!(output, "No activity recorded.").unwrap();
        return output;
    }
    for date in dates {
        writeln!(output, "{date}  {}", date.format("%A")).unwrap();
    }
    output
}

pub fn format_dates_json(dates: &[NaiveDate]) -> Result<String> {
    Ok(serde_json::to_string_pretty(dates)?)
}

/// Runs the dates command.
pub fn run(store: &SessionStore, json: bool) -> Result<()> {
    let dates = AggregationService::new(store).available_dates()?;
    if json {
        println!("{}", format_dates_json(&dates)?);
    } else {
        print!("{}", format_dates(&dates));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use nat_core::InputType;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn dates_are_listed_newest_first() {
        let store = SessionStore::open_in_memory().unwrap();
        for d in [14, 16, 14] {
            let start = day(d).and_hms_opt(12, 0, 0).unwrap();
            store
                .insert_session(InputType::Mouse, start, start + chrono::TimeDelta::seconds(5))
                .unwrap();
        }
        let dates = store.list_dates().unwrap();

        assert_snapshot!(format_dates(&dates), @r"
        2025-01-16  Thursday
        2025-01-14  Tuesday
        ");
        assert_eq!(
            format_dates_json(&dates).unwrap(),
            "[\n  \"2025-01-16\",\n  \"2025-01-14\"\n]"
        );
    }

    #[test]
    fn empty_store_has_no_dates() {
        assert_eq!(format_dates(&[]), "No activity recorded.\n");
    }
}
