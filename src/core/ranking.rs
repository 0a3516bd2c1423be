use crate::core::filter::EvaluatedOffer;

pub const DEFAULT_RESULTS_LIMIT: usize = 3;

/// 依價格由低到高排序的前 N 筆 offer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub offers: Vec<EvaluatedOffer>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn cheapest(&self) -> Option<&EvaluatedOffer> {
        self.offers.first()
    }
}

/// 合併所有組合中通過過濾的 offer，穩定排序後取前 `limit` 筆。
/// 同價時保留發現順序
pub fn select_cheapest<I>(offers: I, limit: usize) -> Selection
where
    I: IntoIterator<Item = EvaluatedOffer>,
{
    let mut survivors: Vec<EvaluatedOffer> = offers
        .into_iter()
        .filter(|e| e.verdict.is_accepted())
        .collect();

    // sort_by 是穩定排序
    survivors.sort_by(|a, b| a.offer.price_total.total_cmp(&b.offer.price_total));
    survivors.truncate(limit);

    Selection { offers: survivors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::{ItineraryCheck, Leg, RejectReason, Verdict};
    use crate::domain::model::{Offer, SearchQuery};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn evaluated(price: f64, origin: &str, verdict: Verdict) -> EvaluatedOffer {
        EvaluatedOffer {
            offer: Offer {
                price_total: price,
                currency: "EUR".to_string(),
                itineraries: vec![],
            },
            query: Arc::new(SearchQuery {
                origin: origin.to_string(),
                destination: "LIS".to_string(),
                departure_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                return_date: None,
                adults: 1,
                children: 0,
                currency: "EUR".to_string(),
                max_stops: None,
                max_duration_hours: None,
                max_results: 50,
            }),
            verdict,
        }
    }

    #[test]
    fn test_stable_order_on_price_ties() {
        let offers = vec![
            evaluated(500.0, "AMS", Verdict::Accepted),
            evaluated(300.0, "EIN", Verdict::Accepted),
            evaluated(300.0, "RTM", Verdict::Accepted),
            evaluated(900.0, "AMS", Verdict::Accepted),
        ];

        let selection = select_cheapest(offers, 3);

        let picked: Vec<(f64, &str)> = selection
            .offers
            .iter()
            .map(|e| (e.offer.price_total, e.query.origin.as_str()))
            .collect();
        assert_eq!(picked, vec![(300.0, "EIN"), (300.0, "RTM"), (500.0, "AMS")]);
    }

    #[test]
    fn test_rejected_offers_are_not_ranked() {
        let offers = vec![
            evaluated(
                10.0,
                "AMS",
                Verdict::Rejected(RejectReason::Itinerary {
                    leg: Leg::Outbound,
                    check: ItineraryCheck::StopsExceeded,
                }),
            ),
            evaluated(20.0, "AMS", Verdict::Accepted),
        ];

        let selection = select_cheapest(offers, 3);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.cheapest().unwrap().offer.price_total, 20.0);
    }

    #[test]
    fn test_numeric_not_lexical_ordering() {
        let offers = vec![
            evaluated(1000.0, "AMS", Verdict::Accepted),
            evaluated(95.5, "AMS", Verdict::Accepted),
        ];
        let selection = select_cheapest(offers, DEFAULT_RESULTS_LIMIT);
        assert_eq!(selection.offers[0].offer.price_total, 95.5);
    }

    #[test]
    fn test_empty_input_yields_empty_selection() {
        let selection = select_cheapest(Vec::new(), 3);
        assert!(selection.is_empty());
        assert!(selection.cheapest().is_none());
    }
}
