//! Request context as seen from scripts.
//!
//! Rhai passes object maps by value, so a handler that writes to a plain map
//! would be writing to its own copy. Contexts are therefore built on
//! [`SharedMap`], a native type whose clones all point at one map.

use std::sync::Arc;

use cannoli_core::Request;
use parking_lot::RwLock;
use rhai::{Array, Dynamic, Engine, ImmutableString, Map};

use crate::error::BridgeError;
use crate::interpreter::Interpreter;

/// Script function that turns the request fields into a context object.
pub const CONSTRUCTOR: &str = "new_cannoli";

/// Names of the request fields handed to the constructor.
pub const REQUEST_FIELDS: [&str; 8] = [
    "method",
    "path",
    "path_info",
    "query_string",
    "body",
    "headers",
    "remote_addr",
    "content_type",
];

/// Object map with reference semantics.
#[derive(Debug, Clone, Default)]
pub struct SharedMap(Arc<RwLock<Map>>);

impl SharedMap {
    pub fn get(&self, key: &str) -> Dynamic {
        self.0.read().get(key).cloned().unwrap_or(Dynamic::UNIT)
    }

    pub fn set(&self, key: &str, value: Dynamic) {
        self.0.write().insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Dynamic {
        self.0.write().remove(key).unwrap_or(Dynamic::UNIT)
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn keys(&self) -> Array {
        self.0.read().keys().map(|k| Dynamic::from(k.to_string())).collect()
    }

    /// Snapshot as a plain object map.
    pub fn to_map(&self) -> Map {
        self.0.read().clone()
    }
}

impl From<Map> for SharedMap {
    fn from(map: Map) -> Self {
        SharedMap(Arc::new(RwLock::new(map)))
    }
}

/// Register `SharedMap` and its script API on `engine`.
pub fn register_context_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<SharedMap>("SharedMap")
        .register_fn("shared_map", |fields: Map| SharedMap::from(fields))
        .register_fn("shared_map", SharedMap::default)
        .register_indexer_get(|map: &mut SharedMap, key: ImmutableString| map.get(&key))
        .register_indexer_set(|map: &mut SharedMap, key: ImmutableString, value: Dynamic| {
            map.set(&key, value)
        })
        .register_fn("contains", |map: &mut SharedMap, key: ImmutableString| map.contains(&key))
        .register_fn("remove", |map: &mut SharedMap, key: ImmutableString| map.remove(&key))
        .register_fn("len", |map: &mut SharedMap| map.len() as rhai::INT)
        .register_fn("is_empty", |map: &mut SharedMap| map.is_empty())
        .register_fn("keys", |map: &mut SharedMap| map.keys())
        .register_fn("to_map", |map: &mut SharedMap| map.to_map())
        .register_fn("to_string", |map: &mut SharedMap| format!("{:?}", map.to_map()))
        .register_fn("to_debug", |map: &mut SharedMap| format!("SharedMap({:?})", map.to_map()));
}

/// The eight request fields as an object map; `headers` is a nested map.
pub fn request_fields(request: &Request) -> Map {
    let headers: Map = request
        .headers
        .iter()
        .map(|(name, value)| (name.as_str().into(), Dynamic::from(value.clone())))
        .collect();

    let mut fields = Map::new();
    fields.insert("method".into(), request.method.clone().into());
    fields.insert("path".into(), request.path.clone().into());
    fields.insert("path_info".into(), request.path_info.clone().into());
    fields.insert("query_string".into(), request.query_string.clone().into());
    fields.insert("body".into(), request.body.clone().into());
    fields.insert("headers".into(), Dynamic::from_map(headers));
    fields.insert("remote_addr".into(), request.remote_addr.clone().into());
    fields.insert("content_type".into(), request.content_type.clone().into());
    fields
}

impl Interpreter {
    /// Run the constructor over the request fields.
    ///
    /// An error or a unit result both count as failure.
    pub fn create_context(&self, request: &Request) -> Result<Dynamic, BridgeError> {
        let context = self.call_function(CONSTRUCTOR, (request_fields(request),))?;
        if context.is_unit() {
            return Err(BridgeError::EmptyContext);
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cannoli_core::HeaderMap;

    #[test]
    fn fields_carry_defaults_and_headers() {
        let request = Request::default().with_headers(HeaderMap::parse("X-Foo: bar\n"));
        let fields = request_fields(&request);

        assert_eq!(fields.len(), REQUEST_FIELDS.len());
        for name in REQUEST_FIELDS {
            assert!(fields.contains_key(name), "missing {name}");
        }
        assert_eq!(fields["method"].clone().into_string().unwrap(), "GET");
        assert_eq!(fields["path"].clone().into_string().unwrap(), "/");
        assert_eq!(fields["body"].clone().into_string().unwrap(), "");

        let headers = fields["headers"].clone().cast::<Map>();
        assert_eq!(headers["x-foo"].clone().into_string().unwrap(), "bar");
    }

    #[test]
    fn shared_map_clones_see_writes() {
        let mut engine = Engine::new();
        register_context_api(&mut engine);

        let result = engine
            .eval::<String>(
                r#"
                fn touch(c) { c["seen"] = "yes"; }
                let c = shared_map(#{ path: "/x" });
                touch(c);
                c["seen"] + ":" + c["path"]
                "#,
            )
            .unwrap();
        assert_eq!(result, "yes:/x");
    }

    #[test]
    fn missing_keys_read_as_unit() {
        let mut engine = Engine::new();
        register_context_api(&mut engine);

        let missing = engine
            .eval::<bool>(r#"let c = shared_map(); c["nope"] == ()"#)
            .unwrap();
        assert!(missing);
    }
}
