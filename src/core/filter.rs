use crate::core::duration::duration_hours;
use crate::domain::model::{Itinerary, Offer, SearchQuery};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItineraryPolicy {
    pub max_stops: Option<u32>,
    pub max_duration_hours: Option<f64>,
}

impl From<&SearchQuery> for ItineraryPolicy {
    fn from(query: &SearchQuery) -> Self {
        Self {
            max_stops: query.max_stops,
            max_duration_hours: query.max_duration_hours,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItineraryCheck {
    Ok,
    StopsExceeded,
    DurationExceeded,
}

impl ItineraryCheck {
    pub fn code(&self) -> &'static str {
        match self {
            ItineraryCheck::Ok => "ok",
            ItineraryCheck::StopsExceeded => "stops_exceeded",
            ItineraryCheck::DurationExceeded => "duration_exceeded",
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, ItineraryCheck::Ok)
    }
}

/// 兩項檢查都會執行；同時失敗時回報 stops
pub fn evaluate_itinerary(itinerary: &Itinerary, policy: &ItineraryPolicy) -> ItineraryCheck {
    let stops_ok = policy
        .max_stops
        .map_or(true, |max| itinerary.stop_count() <= max as usize);
    let duration_ok = policy
        .max_duration_hours
        .map_or(true, |max| duration_hours(&itinerary.duration) <= max);

    match (stops_ok, duration_ok) {
        (false, _) => ItineraryCheck::StopsExceeded,
        (true, false) => ItineraryCheck::DurationExceeded,
        (true, true) => ItineraryCheck::Ok,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Outbound,
    Return,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Outbound => write!(f, "outbound"),
            Leg::Return => write!(f, "return"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    Malformed(String),
    Itinerary { leg: Leg, check: ItineraryCheck },
    DepartureTooEarly { hour: Option<u32>, earliest_hour: u32 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Malformed(detail) => write!(f, "malformed: {}", detail),
            RejectReason::Itinerary { leg, check } => write!(f, "{} {}", leg, check.code()),
            RejectReason::DepartureTooEarly {
                hour: Some(hour),
                earliest_hour,
            } => write!(f, "departs at {:02}h, before {:02}h", hour, earliest_hour),
            RejectReason::DepartureTooEarly {
                hour: None,
                earliest_hour,
            } => write!(f, "unknown departure time, preference {:02}h", earliest_hour),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// 已解碼並評估過的 offer，附帶來源查詢以便報表標示
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedOffer {
    pub offer: Offer,
    pub query: Arc<SearchQuery>,
    pub verdict: Verdict,
}

pub fn evaluate_offer(offer: &Offer, query: &SearchQuery) -> Verdict {
    let expected_legs = if query.is_round_trip() { 2 } else { 1 };
    if offer.itineraries.len() != expected_legs {
        return Verdict::Rejected(RejectReason::Malformed(format!(
            "expected {} itineraries, got {}",
            expected_legs,
            offer.itineraries.len()
        )));
    }

    let policy = ItineraryPolicy::from(query);
    let legs = [Leg::Outbound, Leg::Return];
    for (itinerary, leg) in offer.itineraries.iter().zip(legs) {
        let check = evaluate_itinerary(itinerary, &policy);
        if !check.passed() {
            return Verdict::Rejected(RejectReason::Itinerary { leg, check });
        }
    }

    Verdict::Accepted
}

/// 軟性偏好：指定 origin 的去程出發時間需晚於 `earliest_hour`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeparturePreference {
    pub origin: String,
    pub earliest_hour: u32,
}

/// 套用偏好會把結果清空時，放棄偏好並保留原本的集合
pub fn apply_departure_preference(
    origin: &str,
    offers: &mut [EvaluatedOffer],
    preferences: &[DeparturePreference],
) {
    let Some(pref) = preferences.iter().find(|p| p.origin == origin) else {
        return;
    };

    let hour_of = |e: &EvaluatedOffer| e.offer.outbound().and_then(|it| it.departure_hour());
    let satisfied = |e: &EvaluatedOffer| hour_of(e).is_some_and(|h| h >= pref.earliest_hour);

    let accepted = offers.iter().filter(|e| e.verdict.is_accepted());
    if !accepted.clone().any(satisfied) {
        if accepted.count() > 0 {
            tracing::debug!(
                "Departure preference {:02}h for {} waived: no offer qualifies",
                pref.earliest_hour,
                origin
            );
        }
        return;
    }

    for evaluated in offers.iter_mut() {
        if evaluated.verdict.is_accepted() && !satisfied(evaluated) {
            evaluated.verdict = Verdict::Rejected(RejectReason::DepartureTooEarly {
                hour: hour_of(evaluated),
                earliest_hour: pref.earliest_hour,
            });
        }
    }
}

/// 單一組合的過濾結果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinationFilter {
    /// 成功解碼的 offer，依供應商回傳順序，含被拒絕者
    pub evaluated: Vec<EvaluatedOffer>,
    /// 無法解碼的原始資料
    pub malformed: Vec<RejectReason>,
}

impl CombinationFilter {
    pub fn accepted(&self) -> impl Iterator<Item = &EvaluatedOffer> {
        self.evaluated.iter().filter(|e| e.verdict.is_accepted())
    }

    pub fn rejected_count(&self) -> usize {
        self.malformed.len() + self.evaluated.len() - self.accepted().count()
    }
}

pub fn filter_combination(
    query: &Arc<SearchQuery>,
    raw_offers: &[serde_json::Value],
    preferences: &[DeparturePreference],
) -> CombinationFilter {
    let mut result = CombinationFilter::default();

    for raw in raw_offers {
        match Offer::try_from(raw) {
            Ok(offer) => {
                let verdict = evaluate_offer(&offer, query);
                result.evaluated.push(EvaluatedOffer {
                    offer,
                    query: Arc::clone(query),
                    verdict,
                });
            }
            Err(e) => {
                tracing::debug!("Skipping offer for {}: {}", query.label(), e);
                result.malformed.push(RejectReason::Malformed(e.0));
            }
        }
    }

    apply_departure_preference(&query.origin, &mut result.evaluated, preferences);
    result
}
