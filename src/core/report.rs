use crate::core::filter::{CombinationFilter, EvaluatedOffer};
use crate::core::ranking::Selection;
use crate::core::search::CombinationResult;
use crate::domain::model::Itinerary;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub title: String,
    pub include_diagnostics: bool,
    pub max_diagnostic_lines: usize,
    pub max_error_chars: usize,
    /// 只影響通知內容，不影響排名
    pub price_threshold: Option<f64>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: "Fare report".to_string(),
            include_diagnostics: true,
            max_diagnostic_lines: 10,
            max_error_chars: 200,
            price_threshold: None,
        }
    }
}

/// 單一組合的統計，供報表的診斷區塊使用
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationDiagnostic {
    pub label: String,
    pub http_status: Option<u16>,
    pub offers_returned: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub error: Option<String>,
}

impl CombinationDiagnostic {
    pub fn new(result: &CombinationResult, filtered: &CombinationFilter) -> Self {
        Self {
            label: result.query.label(),
            http_status: result.response.http_status,
            offers_returned: result.response.offers.len(),
            accepted: filtered.accepted().count(),
            rejected: filtered.rejected_count(),
            error: result.response.error.clone(),
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

/// 價格門檻內、實際會出現在通知裡的 offer
pub fn visible_offers<'a>(
    selection: &'a Selection,
    options: &ReportOptions,
) -> Vec<&'a EvaluatedOffer> {
    selection
        .offers
        .iter()
        .filter(|e| {
            options
                .price_threshold
                .map_or(true, |limit| e.offer.price_total <= limit)
        })
        .collect()
}

fn push_bounded(out: &mut String, lines: Vec<String>, max_lines: usize) {
    let total = lines.len();
    for line in lines.into_iter().take(max_lines) {
        let _ = writeln!(out, "• {}", line);
    }
    if total > max_lines {
        let _ = writeln!(out, "… +{} more", total - max_lines);
    }
}

fn status_text(status: Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| format!("HTTP {}", s))
}

fn short_duration(raw: &str) -> &str {
    raw.strip_prefix("PT").unwrap_or(raw)
}

fn write_leg(out: &mut String, name: &str, itinerary: &Itinerary) {
    let _ = writeln!(
        out,
        "   {}: {}, stops: {}",
        name,
        short_duration(&itinerary.duration),
        itinerary.stop_count()
    );
    for segment in &itinerary.segments {
        let _ = writeln!(
            out,
            "   • {} {} → {} {} ({}{})",
            segment.departure_airport,
            segment.departure_at.format("%H:%M"),
            segment.arrival_airport,
            segment.arrival_at.format("%H:%M"),
            segment.carrier_code,
            segment.flight_number.as_deref().unwrap_or("")
        );
    }
}

fn write_offer(out: &mut String, rank: usize, evaluated: &EvaluatedOffer) {
    let offer = &evaluated.offer;
    let query = &evaluated.query;

    let _ = writeln!(
        out,
        "{}. {:.2} {} · {}",
        rank,
        offer.price_total,
        offer.currency,
        query.label()
    );

    let carriers = offer.carriers();
    if !carriers.is_empty() {
        let _ = writeln!(out, "   Carriers: {}", carriers.join(", "));
    }
    if let Some(outbound) = offer.outbound() {
        write_leg(out, "Outbound", outbound);
    }
    if let Some(inbound) = offer.inbound() {
        write_leg(out, "Return", inbound);
    }

    let passengers = if query.children > 0 {
        format!("{} adults + {} children", query.adults, query.children)
    } else {
        format!("{} adults", query.adults)
    };
    let _ = writeln!(out, "   Price for {}", passengers);
}

pub fn render_report(
    selection: &Selection,
    diagnostics: &[CombinationDiagnostic],
    options: &ReportOptions,
) -> String {
    let mut out = String::new();

    let failures: Vec<&CombinationDiagnostic> = diagnostics.iter().filter(|d| d.failed()).collect();
    let _ = writeln!(out, "✈️ {}", options.title);
    if !diagnostics.is_empty() {
        let _ = writeln!(
            out,
            "Searched {} combinations: {} ok, {} failed",
            diagnostics.len(),
            diagnostics.len() - failures.len(),
            failures.len()
        );
    }

    // 失敗一定要列出，不能和「沒有符合條件」混為一談
    if !failures.is_empty() {
        let _ = writeln!(out, "\n⚠️ Search failures ({}):", failures.len());
        let lines = failures
            .iter()
            .map(|d| {
                let detail = d.error.as_deref().unwrap_or("");
                format!(
                    "{}: {} {}",
                    d.label,
                    status_text(d.http_status),
                    truncate_chars(detail, options.max_error_chars)
                )
                .trim_end()
                .to_string()
            })
            .collect();
        push_bounded(&mut out, lines, options.max_diagnostic_lines);
    }

    if options.include_diagnostics {
        let lines: Vec<String> = diagnostics
            .iter()
            .filter(|d| !d.failed())
            .map(|d| {
                format!(
                    "{}: {}, {} offers, {} kept, {} rejected",
                    d.label,
                    status_text(d.http_status),
                    d.offers_returned,
                    d.accepted,
                    d.rejected
                )
            })
            .collect();
        if !lines.is_empty() {
            let _ = writeln!(out, "\n📊 Per-combination results:");
            push_bounded(&mut out, lines, options.max_diagnostic_lines);
        }
    }

    out.push('\n');
    let visible = visible_offers(selection, options);
    match (selection.cheapest(), visible.is_empty()) {
        (None, _) => {
            let _ = writeln!(out, "No qualifying offers found.");
        }
        (Some(cheapest), true) => {
            let _ = writeln!(
                out,
                "No offers at or below {:.2} {} (cheapest found: {:.2} {}).",
                options.price_threshold.unwrap_or_default(),
                cheapest.offer.currency,
                cheapest.offer.price_total,
                cheapest.offer.currency
            );
        }
        (Some(_), false) => {
            for (index, evaluated) in visible.iter().enumerate() {
                if index > 0 {
                    out.push('\n');
                }
                write_offer(&mut out, index + 1, evaluated);
            }
            let hidden = selection.len() - visible.len();
            if hidden > 0 {
                let _ = writeln!(out, "\n({} more above the price threshold)", hidden);
            }
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::Verdict;
    use crate::domain::model::{Offer, SearchQuery, Segment};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::Arc;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn query() -> Arc<SearchQuery> {
        Arc::new(SearchQuery {
            origin: "AMS".to_string(),
            destination: "LIS".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2025, 8, 10),
            adults: 2,
            children: 2,
            currency: "EUR".to_string(),
            max_stops: Some(1),
            max_duration_hours: Some(12.0),
            max_results: 50,
        })
    }

    fn offer(price: f64) -> EvaluatedOffer {
        let segment = |from: &str, dep: &str, to: &str, arr: &str, number: Option<&str>| Segment {
            departure_airport: from.to_string(),
            departure_at: ts(dep),
            arrival_airport: to.to_string(),
            arrival_at: ts(arr),
            carrier_code: "TP".to_string(),
            flight_number: number.map(str::to_string),
        };
        EvaluatedOffer {
            offer: Offer {
                price_total: price,
                currency: "EUR".to_string(),
                itineraries: vec![
                    Itinerary {
                        duration: "PT2H55M".to_string(),
                        segments: vec![segment(
                            "AMS",
                            "2025-08-01T18:05:00",
                            "LIS",
                            "2025-08-01T20:00:00",
                            Some("663"),
                        )],
                    },
                    Itinerary {
                        duration: "PT3H".to_string(),
                        segments: vec![segment("LIS", "2025-08-10T06:00:00", "AMS", "2025-08-10T10:00:00", None)],
                    },
                ],
            },
            query: query(),
            verdict: Verdict::Accepted,
        }
    }

    fn diagnostic(label: &str, error: Option<&str>) -> CombinationDiagnostic {
        CombinationDiagnostic {
            label: label.to_string(),
            http_status: Some(if error.is_some() { 400 } else { 200 }),
            offers_returned: 4,
            accepted: 2,
            rejected: 2,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_ranked_offer_rendering() {
        let selection = Selection {
            offers: vec![offer(412.3)],
        };
        let text = render_report(&selection, &[], &ReportOptions::default());

        assert!(text.starts_with("✈️ Fare report"));
        assert!(text.contains("1. 412.30 EUR · AMS→LIS 2025-08-01/2025-08-10"));
        assert!(text.contains("Carriers: TP"));
        assert!(text.contains("Outbound: 2H55M, stops: 0"));
        assert!(text.contains("• AMS 18:05 → LIS 20:00 (TP663)"));
        assert!(text.contains("• LIS 06:00 → AMS 10:00 (TP)"));
        assert!(text.contains("Price for 2 adults + 2 children"));
    }

    #[test]
    fn test_no_offers_notice_is_distinct_from_failures() {
        let empty = Selection::default();

        let quiet = render_report(&empty, &[diagnostic("AMS→LIS", None)], &ReportOptions::default());
        assert!(quiet.contains("No qualifying offers found."));
        assert!(!quiet.contains("Search failures"));

        let failing = render_report(
            &empty,
            &[diagnostic("AMS→LIS", Some("INVALID DATE"))],
            &ReportOptions::default(),
        );
        assert!(failing.contains("⚠️ Search failures (1):"));
        assert!(failing.contains("• AMS→LIS: HTTP 400 INVALID DATE"));
        assert!(failing.contains("No qualifying offers found."));
    }

    #[test]
    fn test_diagnostics_are_truncated() {
        let diagnostics: Vec<_> = (0..15).map(|i| diagnostic(&format!("combo {}", i), None)).collect();
        let options = ReportOptions {
            max_diagnostic_lines: 4,
            ..ReportOptions::default()
        };

        let text = render_report(&Selection::default(), &diagnostics, &options);
        assert!(text.contains("• combo 3: HTTP 200, 4 offers, 2 kept, 2 rejected"));
        assert!(!text.contains("combo 4:"));
        assert!(text.contains("… +11 more"));
    }

    #[test]
    fn test_diagnostics_can_be_disabled_but_failures_remain() {
        let options = ReportOptions {
            include_diagnostics: false,
            ..ReportOptions::default()
        };
        let text = render_report(
            &Selection::default(),
            &[diagnostic("ok combo", None), diagnostic("bad combo", Some("boom"))],
            &options,
        );
        assert!(!text.contains("Per-combination"));
        assert!(text.contains("bad combo: HTTP 400 boom"));
    }

    #[test]
    fn test_error_samples_are_truncated() {
        let long_error = "x".repeat(500);
        let options = ReportOptions {
            max_error_chars: 20,
            ..ReportOptions::default()
        };
        let text = render_report(
            &Selection::default(),
            &[diagnostic("bad", Some(&long_error))],
            &options,
        );
        assert!(text.contains(&format!("{}…", "x".repeat(20))));
        assert!(!text.contains(&"x".repeat(21)));
    }

    #[test]
    fn test_price_threshold_only_hides_offers() {
        let selection = Selection {
            offers: vec![offer(300.0), offer(450.0)],
        };
        let options = ReportOptions {
            price_threshold: Some(400.0),
            ..ReportOptions::default()
        };
        let text = render_report(&selection, &[], &options);
        assert!(text.contains("1. 300.00 EUR"));
        assert!(!text.contains("450.00"));
        assert!(text.contains("(1 more above the price threshold)"));

        let strict = ReportOptions {
            price_threshold: Some(100.0),
            ..ReportOptions::default()
        };
        let text = render_report(&selection, &[], &strict);
        assert!(text.contains("No offers at or below 100.00 EUR (cheapest found: 300.00 EUR)."));
    }

    #[test]
    fn test_offer_without_segments_still_renders() {
        let mut bare = offer(99.0);
        bare.offer.itineraries.truncate(1);
        bare.offer.itineraries[0].segments.clear();
        let text = render_report(
            &Selection { offers: vec![bare] },
            &[],
            &ReportOptions::default(),
        );
        assert!(text.contains("1. 99.00 EUR"));
        assert!(text.contains("Outbound: 2H55M, stops: 0"));
        assert!(!text.contains("Carriers"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc…");
        assert_eq!(truncate_chars("✈️✈️", 10), "✈️✈️");
    }
}
