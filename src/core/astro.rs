use serde_json::{Map, Value};
use crate::models::{
    AstrologicalDetails, CompatibilityResult, Gender, KootDetails, NakshatraDetails, RashiDetails,
};

/// Key of the provider sub-record describing a person of the given gender
#[inline]
pub fn person_info_key(gender: Gender) -> &'static str {
    match gender {
        Gender::Female => "girl_info",
        Gender::Male => "boy_info",
    }
}

/// Pull the candidate's nakshatra, rashi and koot out of the raw provider payload
///
/// Anything missing or of an unexpected type is left out of the result.
pub fn extract_astrological_details(raw_response: &Value, gender: Gender) -> AstrologicalDetails {
    let Some(person) = non_empty_object(raw_response.get(person_info_key(gender))) else {
        return AstrologicalDetails::default();
    };

    let nakshatra = non_empty_object(person.get("nakshatra")).map(|n| NakshatraDetails {
        name: text(n.get("name")),
        lord: lord_name(n),
        pada: n.get("pada").and_then(Value::as_u64),
    });

    let rashi = non_empty_object(person.get("rasi")).map(|r| RashiDetails {
        name: text(r.get("name")),
        lord: lord_name(r),
    });

    let koot = non_empty_object(person.get("koot")).map(|k| KootDetails {
        varna: text(k.get("varna")),
        gana: text(k.get("gana")),
        nadi: text(k.get("nadi")),
    });

    AstrologicalDetails { nakshatra, rashi, koot }
}

/// Provider's description of the pairing, falling back to the normalized summary
pub fn message_description(compatibility: &CompatibilityResult) -> String {
    match compatibility.raw_response.pointer("/message/description") {
        Some(Value::String(description)) => description.clone(),
        Some(_) => String::new(),
        None => compatibility.summary.clone(),
    }
}

fn non_empty_object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object).filter(|m| !m.is_empty())
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn lord_name(record: &Map<String, Value>) -> Option<String> {
    text(record.get("lord").and_then(|lord| lord.get("name")))
}
