use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// 單一搜尋組合 (origin, destination, outbound, return) 的完整查詢條件
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    /// `None` 代表單程
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
    pub children: u32,
    pub currency: String,
    pub max_stops: Option<u32>,
    pub max_duration_hours: Option<f64>,
    pub max_results: u32,
}

impl SearchQuery {
    pub fn is_round_trip(&self) -> bool {
        self.return_date.is_some()
    }

    /// 報表與日誌用的簡短標籤，例如 `AMS→LIS 2025-08-01/2025-08-10`
    pub fn label(&self) -> String {
        match self.return_date {
            Some(ret) => format!(
                "{}→{} {}/{}",
                self.origin, self.destination, self.departure_date, ret
            ),
            None => format!(
                "{}→{} {} (one-way)",
                self.origin, self.destination, self.departure_date
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub departure_airport: String,
    pub departure_at: NaiveDateTime,
    pub arrival_airport: String,
    pub arrival_at: NaiveDateTime,
    pub carrier_code: String,
    pub flight_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    /// 供應商原始的 ISO-8601 duration 字串，解析交給 `core::duration`
    pub duration: String,
    pub segments: Vec<Segment>,
}

impl Itinerary {
    pub fn stop_count(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    pub fn departure_hour(&self) -> Option<u32> {
        self.segments.first().map(|s| s.departure_at.hour())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub price_total: f64,
    pub currency: String,
    pub itineraries: Vec<Itinerary>,
}

impl Offer {
    pub fn outbound(&self) -> Option<&Itinerary> {
        self.itineraries.first()
    }

    pub fn inbound(&self) -> Option<&Itinerary> {
        self.itineraries.get(1)
    }

    pub fn carriers(&self) -> Vec<String> {
        self.itineraries
            .iter()
            .flat_map(|it| it.segments.iter())
            .map(|s| s.carrier_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed offer: {0}")]
pub struct MalformedOffer(pub String);

// 供應商 JSON 的線上格式，只在解碼時使用
#[derive(Deserialize)]
struct WireOffer {
    price: WirePrice,
    itineraries: Vec<WireItinerary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePrice {
    grand_total: Option<String>,
    total: Option<String>,
    currency: String,
}

#[derive(Deserialize)]
struct WireItinerary {
    duration: String,
    #[serde(default)]
    segments: Vec<WireSegment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSegment {
    departure: WireEndpoint,
    arrival: WireEndpoint,
    carrier_code: String,
    number: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEndpoint {
    iata_code: String,
    at: NaiveDateTime,
}

impl TryFrom<&serde_json::Value> for Offer {
    type Error = MalformedOffer;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        let wire = WireOffer::deserialize(value).map_err(|e| MalformedOffer(e.to_string()))?;

        let raw_price = wire
            .price
            .grand_total
            .or(wire.price.total)
            .ok_or_else(|| MalformedOffer("price has neither grandTotal nor total".to_string()))?;
        let price_total: f64 = raw_price
            .trim()
            .parse()
            .map_err(|_| MalformedOffer(format!("unparseable price '{}'", raw_price)))?;
        if !price_total.is_finite() || price_total < 0.0 {
            return Err(MalformedOffer(format!("invalid price '{}'", raw_price)));
        }

        if wire.itineraries.is_empty() {
            return Err(MalformedOffer("offer has no itineraries".to_string()));
        }

        let itineraries = wire
            .itineraries
            .into_iter()
            .map(|it| Itinerary {
                duration: it.duration,
                segments: it
                    .segments
                    .into_iter()
                    .map(|s| Segment {
                        departure_airport: s.departure.iata_code,
                        departure_at: s.departure.at,
                        arrival_airport: s.arrival.iata_code,
                        arrival_at: s.arrival.at,
                        carrier_code: s.carrier_code,
                        flight_number: s.number,
                    })
                    .collect(),
            })
            .collect();

        Ok(Offer {
            price_total,
            currency: wire.price.currency,
            itineraries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segment(from: &str, dep: &str, to: &str, arr: &str, carrier: &str) -> serde_json::Value {
        json!({
            "departure": {"iataCode": from, "at": dep},
            "arrival": {"iataCode": to, "at": arr},
            "carrierCode": carrier,
            "number": "1234"
        })
    }

    #[test]
    fn test_decode_round_trip_offer() {
        let raw = json!({
            "id": "1",
            "price": {"currency": "EUR", "total": "410.00", "grandTotal": "412.30"},
            "itineraries": [
                {"duration": "PT5H10M", "segments": [
                    segment("AMS", "2025-08-01T18:05:00", "MAD", "2025-08-01T20:40:00", "KL"),
                    segment("MAD", "2025-08-01T21:30:00", "LIS", "2025-08-01T22:15:00", "TP")
                ]},
                {"duration": "PT2H55M", "segments": [
                    segment("LIS", "2025-08-10T06:00:00", "AMS", "2025-08-10T09:55:00", "TP")
                ]}
            ]
        });

        let offer = Offer::try_from(&raw).unwrap();
        assert_eq!(offer.price_total, 412.30);
        assert_eq!(offer.currency, "EUR");
        assert_eq!(offer.itineraries.len(), 2);
        assert_eq!(offer.outbound().unwrap().stop_count(), 1);
        assert_eq!(offer.inbound().unwrap().stop_count(), 0);
        assert_eq!(offer.outbound().unwrap().departure_hour(), Some(18));
        assert_eq!(offer.carriers(), vec!["KL".to_string(), "TP".to_string()]);
    }

    #[test]
    fn test_decode_falls_back_to_total_price() {
        let raw = json!({
            "price": {"currency": "EUR", "total": "99.5"},
            "itineraries": [{"duration": "PT1H", "segments": []}]
        });
        let offer = Offer::try_from(&raw).unwrap();
        assert_eq!(offer.price_total, 99.5);
        assert_eq!(offer.itineraries[0].stop_count(), 0);
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let no_price = json!({"itineraries": []});
        assert!(Offer::try_from(&no_price).is_err());

        let bad_price = json!({
            "price": {"currency": "EUR", "grandTotal": "cheap"},
            "itineraries": [{"duration": "PT1H", "segments": []}]
        });
        let err = Offer::try_from(&bad_price).unwrap_err();
        assert!(err.0.contains("cheap"));

        let negative = json!({
            "price": {"currency": "EUR", "grandTotal": "-1"},
            "itineraries": [{"duration": "PT1H", "segments": []}]
        });
        assert!(Offer::try_from(&negative).is_err());

        let no_itineraries = json!({
            "price": {"currency": "EUR", "grandTotal": "10"},
            "itineraries": []
        });
        assert!(Offer::try_from(&no_itineraries).is_err());

        let bad_timestamp = json!({
            "price": {"currency": "EUR", "grandTotal": "10"},
            "itineraries": [{"duration": "PT1H", "segments": [
                segment("AMS", "tomorrow", "LIS", "2025-08-01T20:40:00", "KL")
            ]}]
        });
        assert!(Offer::try_from(&bad_timestamp).is_err());
    }

    #[test]
    fn test_query_label() {
        let mut query = SearchQuery {
            origin: "AMS".to_string(),
            destination: "LIS".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2025, 8, 10),
            adults: 2,
            children: 0,
            currency: "EUR".to_string(),
            max_stops: None,
            max_duration_hours: None,
            max_results: 50,
        };
        assert_eq!(query.label(), "AMS→LIS 2025-08-01/2025-08-10");
        query.return_date = None;
        assert_eq!(query.label(), "AMS→LIS 2025-08-01 (one-way)");
    }
}
