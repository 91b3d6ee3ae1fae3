//! 路由与队列命名（routing）
//!
//! 从事件类型键与订阅者名确定性地推导路由键与队列名：
//! - 路由键：类型键取末尾至多三段，逐段 camelCase → snake_case，点号连接；
//! - 队列名：`<前缀>.<订阅者名 snake_case>`；
//! - 延迟/停车场队列：在主队列名后接 `_dlx` / `_pl` 后缀。
//!
/// 延迟队列后缀
pub const DLX_SUFFIX: &str = "_dlx";
/// 停车场队列后缀
pub const PARKING_LOT_SUFFIX: &str = "_pl";

/// 事件类型键 → 路由键
pub fn route_name(event_type: &str) -> String {
    let segments: Vec<&str> = event_type.split('.').collect();
    let tail = &segments[segments.len().saturating_sub(3)..];
    tail.iter()
        .map(|s| camel_to_snake(s))
        .collect::<Vec<_>>()
        .join(".")
}

/// 订阅者名 → 队列名
pub fn queue_name(prefix: &str, subscriber_name: &str) -> String {
    format!("{}.{}", prefix, camel_to_snake(subscriber_name))
}

pub fn delay_queue(queue: &str) -> String {
    format!("{queue}{DLX_SUFFIX}")
}

pub fn parking_lot_queue(queue: &str) -> String {
    format!("{queue}{PARKING_LOT_SUFFIX}")
}

/// camelCase → snake_case；大写字母仅在紧跟字母时才插入下划线
pub fn camel_to_snake(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut prev_is_letter = false;
    for c in value.chars() {
        if c.is_ascii_uppercase() && prev_is_letter {
            out.push('_');
        }
        prev_is_letter = c.is_ascii_alphabetic();
        out.extend(c.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_to_snake_inserts_underscores_after_letters() {
        assert_eq!(camel_to_snake("OrderCreated"), "order_created");
        assert_eq!(camel_to_snake("order.SendEmail"), "order.send_email");
        assert_eq!(camel_to_snake("plain"), "plain");
    }

    #[test]
    fn route_name_takes_last_three_segments() {
        assert_eq!(
            route_name("com.acme.billing.InvoicePaid"),
            "acme.billing.invoice_paid"
        );
        assert_eq!(route_name("billing.InvoicePaid"), "billing.invoice_paid");
    }

    #[test]
    fn queue_name_combines_prefix_and_snake_cased_name() {
        assert_eq!(
            queue_name("events", "billing.OnInvoicePaid"),
            "events.billing.on_invoice_paid"
        );
    }

    #[test]
    fn suffix_helpers() {
        assert_eq!(delay_queue("events.q"), "events.q_dlx");
        assert_eq!(parking_lot_queue("events.q"), "events.q_pl");
    }
}
