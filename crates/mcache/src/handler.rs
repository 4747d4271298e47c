//! Command handler for model cache scripts

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use modelcache::{memoize, CacheStore, Opaque, Resource, StateDict};
use parking_lot::Mutex;
use serde_json::json;
use tracing::debug;

use crate::reply::Reply;

/// Cached payload: the live resource plus the id of the build that made it
pub type Model = (Arc<dyn Resource>, u64);

/// Store driven by scripts
pub type ModelStore = CacheStore<String, Model>;

pub struct CommandHandler {
    store: Arc<ModelStore>,
    /// Stands in for the runtime that may release parameters of live models.
    /// Holds weak handles so evicted or deleted models are actually dropped.
    runtime: Mutex<HashMap<String, Weak<StateDict<f32>>>>,
    builds: AtomicU64,
}

impl CommandHandler {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self {
            store,
            runtime: Mutex::new(HashMap::new()),
            builds: AtomicU64::new(0),
        }
    }

    /// Handle one script line; blank lines and `#` comments produce no reply
    pub fn handle(&self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut parts = line.split_whitespace();
        let command = parts.next()?.to_uppercase();
        let args: Vec<&str> = parts.collect();
        debug!(command = %command, ?args, "Handling command");

        let reply = match command.as_str() {
            "PING" => self.handle_ping(&args),
            "BUILD" => self.handle_build(&args),
            "INSERT" => self.handle_insert(&args),
            "INSERT_OPAQUE" => self.handle_insert_opaque(&args),
            "CACHED" => self.handle_cached(&args),
            "GET" => self.handle_get(&args),
            "RELEASE" => self.handle_release(&args),
            "CONTAINS" => self.handle_contains(&args),
            "SIGNATURE" => self.handle_signature(&args),
            "DEL" => self.handle_del(&args),
            "KEYS" => self.handle_keys(),
            "LEN" => Reply::Integer(self.store.len() as i64),
            "CLEAR" => self.handle_clear(),
            "INFO" => self.handle_info(),
            _ => Reply::Error(format!("ERR unknown command '{}'", command)),
        };
        Some(reply)
    }

    fn handle_ping(&self, args: &[&str]) -> Reply {
        match args {
            [] => Reply::Status("PONG".to_string()),
            [msg] => Reply::Text(msg.to_string()),
            _ => wrong_arity("ping"),
        }
    }

    /// Full wrapper contract: reuse a valid cached model or build a new one
    fn handle_build(&self, args: &[&str]) -> Reply {
        let (key, params) = match key_and_count(args, "build") {
            Ok(parsed) => parsed,
            Err(reply) => return reply,
        };

        let built = Cell::new(false);
        let model = memoize(&*self.store, key.to_string(), || {
            built.set(true);
            self.build_model(key, params)
        });

        let verb = if built.get() { "built" } else { "cached" };
        Reply::Text(format!("{} #{}", verb, model.1))
    }

    fn handle_insert(&self, args: &[&str]) -> Reply {
        let (key, params) = match key_and_count(args, "insert") {
            Ok(parsed) => parsed,
            Err(reply) => return reply,
        };

        let model = self.build_model(key, params);
        self.store.insert(key.to_string(), model);
        Reply::ok()
    }

    fn handle_insert_opaque(&self, args: &[&str]) -> Reply {
        let [key] = args else {
            return wrong_arity("insert_opaque");
        };

        self.runtime.lock().remove(*key);
        let resource: Arc<dyn Resource> = Arc::new(Opaque(key.to_string()));
        self.store.insert(key.to_string(), (resource, self.next_build_id()));
        Reply::ok()
    }

    fn handle_cached(&self, args: &[&str]) -> Reply {
        let [key] = args else {
            return wrong_arity("cached");
        };
        Reply::Bool(self.store.is_cached(&key.to_string()))
    }

    fn handle_get(&self, args: &[&str]) -> Reply {
        let [key] = args else {
            return wrong_arity("get");
        };

        match self.store.retrieve(&key.to_string()) {
            Ok(model) => Reply::Integer(model.1 as i64),
            Err(e) => Reply::Error(format!("ERR {}", e)),
        }
    }

    /// Drop the last `n` parameters of a live model, as an offloading runtime would
    fn handle_release(&self, args: &[&str]) -> Reply {
        let (key, count) = match key_and_count(args, "release") {
            Ok(parsed) => parsed,
            Err(reply) => return reply,
        };

        let resource = match self.runtime.lock().get(key).and_then(Weak::upgrade) {
            Some(resource) => resource,
            None => return Reply::Error(format!("ERR no releasable model for '{}'", key)),
        };

        let names = resource.names();
        let released = names
            .iter()
            .rev()
            .take(count)
            .filter(|name| resource.remove(name).is_some())
            .count();
        Reply::Integer(released as i64)
    }

    fn handle_contains(&self, args: &[&str]) -> Reply {
        let [key] = args else {
            return wrong_arity("contains");
        };
        Reply::Bool(self.store.contains_key(&key.to_string()))
    }

    fn handle_signature(&self, args: &[&str]) -> Reply {
        let [key] = args else {
            return wrong_arity("signature");
        };
        match self.store.signature(&key.to_string()) {
            Some(signature) => Reply::Text(signature.to_string()),
            None => Reply::Nil,
        }
    }

    fn handle_del(&self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return wrong_arity("del");
        }

        let deleted = args
            .iter()
            .filter(|key| self.store.remove(&key.to_string()).is_some())
            .count();
        Reply::Integer(deleted as i64)
    }

    fn handle_keys(&self) -> Reply {
        Reply::List(self.store.keys())
    }

    fn handle_clear(&self) -> Reply {
        self.store.clear();
        Reply::ok()
    }

    fn handle_info(&self) -> Reply {
        let info = json!({
            "version": env!("CARGO_PKG_VERSION"),
            "capacity": self.store.capacity(),
            "len": self.store.len(),
            "keys": self.store.keys(),
            "stats": self.store.stats().snapshot(),
        });
        Reply::Text(info.to_string())
    }

    fn build_model(&self, key: &str, params: usize) -> Model {
        let dict: StateDict<f32> = (0..params)
            .map(|i| (format!("{}.param{}", key, i), 0.0))
            .collect();
        let dict = Arc::new(dict);
        {
            let mut runtime = self.runtime.lock();
            runtime.retain(|_, model| model.strong_count() > 0);
            runtime.insert(key.to_string(), Arc::downgrade(&dict));
        }

        let id = self.next_build_id();
        debug!(key, params, id, "Built model");
        let resource: Arc<dyn Resource> = dict;
        (resource, id)
    }

    fn next_build_id(&self) -> u64 {
        self.builds.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn wrong_arity(command: &str) -> Reply {
    Reply::Error(format!(
        "ERR wrong number of arguments for '{}' command",
        command
    ))
}

fn key_and_count<'a>(args: &[&'a str], command: &str) -> Result<(&'a str, usize), Reply> {
    let [key, count] = args else {
        return Err(wrong_arity(command));
    };
    let count = count
        .parse()
        .map_err(|_| Reply::Error("ERR value is not an integer or out of range".to_string()))?;
    Ok((*key, count))
}
