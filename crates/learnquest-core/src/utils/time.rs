use chrono::{NaiveDate, Utc};

/// Calendar day used for every streak and reward boundary.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Whole days from `from` to `to`; negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_between_is_signed() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(days_between(d, next), 2);
        assert_eq!(days_between(next, d), -2);
        assert_eq!(days_between(d, d), 0);
    }
}
