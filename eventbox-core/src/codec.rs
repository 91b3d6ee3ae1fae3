//! 事件编解码注册表（EventCodecRegistry）
//!
//! 以显式的“类型键 → 编解码器”映射取代运行时反射查找：
//! - 进程启动时调用 `register::<E>()` 逐个登记事件类型；
//! - 未注册的类型键在解码时显式失败，而不是静默丢弃；
//! - 重复注册视为装配错误并拒绝。
//!
use crate::error::{EventError, EventResult};
use crate::event::DomainEvent;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

type DecodeProbe = Arc<dyn Fn(&Value) -> EventResult<()> + Send + Sync>;

/// 事件编解码注册表：稳定字符串键到解码探针的映射
#[derive(Default, Clone)]
pub struct EventCodecRegistry {
    probes: HashMap<&'static str, DecodeProbe>,
}

impl EventCodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个事件类型；重复登记同一类型键返回错误
    pub fn register<E: DomainEvent>(&mut self) -> EventResult<()> {
        if self.probes.contains_key(E::EVENT_TYPE) {
            return Err(EventError::DuplicateEventType {
                event_type: E::EVENT_TYPE.to_string(),
            });
        }
        let probe: DecodeProbe = Arc::new(|body: &Value| {
            serde_json::from_value::<E>(body.clone())
                .map(|_| ())
                .map_err(|e| EventError::Decode {
                    event_type: E::EVENT_TYPE.to_string(),
                    reason: e.to_string(),
                })
        });
        self.probes.insert(E::EVENT_TYPE, probe);
        Ok(())
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.probes.contains_key(event_type)
    }

    /// 编码事件负载；类型未注册视为装配错误
    pub fn encode<E: DomainEvent>(&self, event: &E) -> EventResult<Value> {
        if !self.contains(E::EVENT_TYPE) {
            return Err(EventError::UnknownEventType {
                event_type: E::EVENT_TYPE.to_string(),
            });
        }
        Ok(serde_json::to_value(event)?)
    }

    /// 按静态类型解码事件负载，校验类型键已注册且与 `E` 一致
    pub fn decode<E: DomainEvent>(&self, event_type: &str, body: &Value) -> EventResult<E> {
        if !self.contains(event_type) {
            return Err(EventError::UnknownEventType {
                event_type: event_type.to_string(),
            });
        }
        if event_type != E::EVENT_TYPE {
            return Err(EventError::TypeMismatch {
                expected: E::EVENT_TYPE.to_string(),
                found: event_type.to_string(),
            });
        }
        serde_json::from_value(body.clone()).map_err(|e| EventError::Decode {
            event_type: event_type.to_string(),
            reason: e.to_string(),
        })
    }

    /// 探测负载是否能按已登记的类型键成功解码；
    /// 未知类型键与畸形负载均为硬错误
    pub fn probe(&self, event_type: &str, body: &Value) -> EventResult<()> {
        let probe = self
            .probes
            .get(event_type)
            .ok_or_else(|| EventError::UnknownEventType {
                event_type: event_type.to_string(),
            })?;
        probe(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct MemberJoined {
        member_id: String,
    }

    impl DomainEvent for MemberJoined {
        const EVENT_TYPE: &'static str = "member.MemberJoined";
    }

    #[test]
    fn encode_decode_roundtrip() {
        let mut registry = EventCodecRegistry::new();
        registry.register::<MemberJoined>().unwrap();

        let event = MemberJoined {
            member_id: "m-1".into(),
        };
        let body = registry.encode(&event).unwrap();
        let decoded: MemberJoined = registry
            .decode("member.MemberJoined", &body)
            .unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn unknown_type_is_hard_error() {
        let registry = EventCodecRegistry::new();
        let err = registry
            .decode::<MemberJoined>("member.MemberJoined", &serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, EventError::UnknownEventType { .. }));

        let err = registry
            .probe("ghost.Unknown", &serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, EventError::UnknownEventType { .. }));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = EventCodecRegistry::new();
        registry.register::<MemberJoined>().unwrap();
        let err = registry.register::<MemberJoined>().unwrap_err();
        assert!(matches!(err, EventError::DuplicateEventType { .. }));
    }

    #[test]
    fn malformed_body_fails_probe() {
        let mut registry = EventCodecRegistry::new();
        registry.register::<MemberJoined>().unwrap();
        let err = registry
            .probe("member.MemberJoined", &serde_json::json!({ "bogus": 1 }))
            .unwrap_err();
        assert!(matches!(err, EventError::Decode { .. }));
    }
}
