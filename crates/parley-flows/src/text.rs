//! Input normalization for flow steps

use regex::Regex;
use std::sync::LazyLock;

static LABELLED_ORDER_ID: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"订单[号：:\s]*([0-9]{5,20})(?:[^0-9]|$)")
            .expect("order label pattern is a constant"),
        Regex::new(r"(?i)order[_\s]?id[：:\s=]*([0-9]{5,20})(?:[^0-9]|$)")
            .expect("order_id pattern is a constant"),
        Regex::new(r"(?:单号|运单|快递)[：:\s]*([0-9]{5,20})(?:[^0-9]|$)")
            .expect("waybill pattern is a constant"),
    ]
});

// Whole digit runs only; a longer run is not an order id
static BARE_ORDER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern is a constant"));

/// User's answer at a confirmation prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Submit
    Confirm,
    /// Start over
    Modify,
    /// Anything else, normalized
    Other(String),
}

/// ASCII-lowercase and drop ASCII and full-width spaces
#[must_use]
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{3000}')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Classify a reply to a confirm/modify prompt
#[must_use]
pub fn normalize_confirm(input: &str) -> Confirmation {
    let normalized = normalize(input);
    match normalized.as_str() {
        "确认" | "确认提交" | "确认退货" | "confirm" | "yes" | "y" => Confirmation::Confirm,
        "修改" | "重新填写" | "modify" | "modify_order_id" => Confirmation::Modify,
        _ => Confirmation::Other(normalized),
    }
}

/// Find an order id (5-20 digits) in free text
///
/// Labelled forms (`订单号 12345`, `order_id=12345`, `运单: 12345`) win over a
/// bare digit run.
#[must_use]
pub fn extract_order_id(message: &str) -> Option<String> {
    let message = message.trim();

    LABELLED_ORDER_ID
        .iter()
        .find_map(|re| re.captures(message))
        .and_then(|caps| caps.get(1))
        .or_else(|| {
            BARE_ORDER_ID
                .find_iter(message)
                .find(|m| (5..=20).contains(&m.as_str().len()))
        })
        .map(|m| m.as_str().to_string())
}
