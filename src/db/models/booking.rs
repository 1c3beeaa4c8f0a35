//! Booking models.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use std::str::FromStr;

/// Storage format of `bookings.date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format of `bookings.time`
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub email: String,
    pub date: String,
    pub time: String,
    pub services: String,
    pub staff_name: String,
    pub payment_method: String,
    pub status: String,
    pub created_at: String,
}

impl Booking {
    pub async fn get_by_id(db: &SqlitePool, id: i64) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Delete every booking dated strictly before `cutoff`. Returns the number of rows removed.
    pub async fn delete_dated_before(db: &SqlitePool, cutoff: NaiveDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE date < ?")
            .bind(cutoff.format(DATE_FORMAT).to_string())
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Ongoing,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Ongoing,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Ongoing => "Ongoing",
            BookingStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown booking status: {}", s))
    }
}

/// One service name or several; lists are stored comma-joined.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServiceSelection {
    One(String),
    Many(Vec<String>),
}

impl ServiceSelection {
    /// Join into the stored representation, dropping blank entries.
    /// Returns None when nothing is selected.
    pub fn joined(&self) -> Option<String> {
        let joined = match self {
            ServiceSelection::One(s) => s.trim().to_string(),
            ServiceSelection::Many(list) => list
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        };
        (!joined.is_empty()).then_some(joined)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub email: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub services: Option<ServiceSelection>,
    #[serde(rename = "staffname")]
    pub staff_name: Option<String>,
    #[serde(rename = "paymentmethod")]
    pub payment_method: Option<String>,
}

/// A booking that passed validation and is ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub email: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub services: String,
    pub staff_name: String,
    pub payment_method: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    pub id: Option<i64>,
    pub status: Option<String>,
    #[serde(rename = "paymentmethod")]
    pub payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBookingsQuery {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteBookingQuery {
    pub id: Option<i64>,
    #[serde(default)]
    pub past: bool,
}

/// Booking as shown to clients, with date and time formatted for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: i64,
    pub email: String,
    pub date: String,
    pub time: String,
    pub services: String,
    #[serde(rename = "staffname")]
    pub staff_name: String,
    #[serde(rename = "paymentmethod")]
    pub payment_method: String,
    pub status: String,
    pub created_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            date: display_date(&booking.date),
            time: display_time(&booking.time),
            id: booking.id,
            email: booking.email,
            services: booking.services,
            staff_name: booking.staff_name,
            payment_method: booking.payment_method,
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}

/// `2024-01-01` -> `January 1, 2024`. Values that don't parse are passed through.
pub fn display_date(stored: &str) -> String {
    NaiveDate::parse_from_str(stored, DATE_FORMAT)
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|_| stored.to_string())
}

/// `14:30` -> `2:30 PM`. Values that don't parse are passed through.
pub fn display_time(stored: &str) -> String {
    NaiveTime::parse_from_str(stored, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(stored, "%H:%M:%S"))
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|_| stored.to_string())
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_exact() {
        assert_eq!("Pending".parse::<BookingStatus>(), Ok(BookingStatus::Pending));
        assert_eq!("Ongoing".parse::<BookingStatus>(), Ok(BookingStatus::Ongoing));
        assert_eq!("Completed".parse::<BookingStatus>(), Ok(BookingStatus::Completed));
        assert!("pending".parse::<BookingStatus>().is_err());
        assert!("Cancelled".parse::<BookingStatus>().is_err());
        assert!("".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_service_selection_joined() {
        let one: ServiceSelection = serde_json::from_str(r#""Hair Trim""#).unwrap();
        assert_eq!(one.joined().as_deref(), Some("Hair Trim"));

        let many: ServiceSelection =
            serde_json::from_str(r#"["Hair Trim", " Manicure ", ""]"#).unwrap();
        assert_eq!(many.joined().as_deref(), Some("Hair Trim, Manicure"));

        let empty: ServiceSelection = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.joined(), None);

        let blank: ServiceSelection = serde_json::from_str(r#""   ""#).unwrap();
        assert_eq!(blank.joined(), None);
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(display_date("2024-01-01"), "January 1, 2024");
        assert_eq!(display_date("2024-11-23"), "November 23, 2024");
        assert_eq!(display_time("10:00"), "10:00 AM");
        assert_eq!(display_time("14:30"), "2:30 PM");
        assert_eq!(display_time("00:15"), "12:15 AM");
        assert_eq!(display_time("12:00:00"), "12:00 PM");
        assert_eq!(display_time("soon"), "soon");
    }

    #[test]
    fn test_response_uses_client_field_names() {
        let booking = Booking {
            id: 7,
            email: "a@b.com".to_string(),
            date: "2024-01-01".to_string(),
            time: "10:00".to_string(),
            services: "Hair Trim".to_string(),
            staff_name: "Jo".to_string(),
            payment_method: "cash".to_string(),
            status: "Pending".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        };
        let json = serde_json::to_value(BookingResponse::from(booking)).unwrap();
        assert_eq!(json["staffname"], "Jo");
        assert_eq!(json["paymentmethod"], "cash");
        assert_eq!(json["time"], "10:00 AM");
        assert_eq!(json["date"], "January 1, 2024");
    }
}
