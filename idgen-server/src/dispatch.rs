use idgen_proto::engine::Registry;
use idgen_proto::protocol::{Reply, Request};

/// Dispatches one fully-parsed request by its uppercased first argument.
/// Never panics on a malformed or empty-of-arguments-after-the-command
/// request; arity mismatches become an `-invalid arguments` reply, the way
/// the wire contract requires.
pub fn dispatch(registry: &Registry, request: &Request) -> Reply {
    let command = request[0].to_ascii_uppercase();
    match command.as_slice() {
        b"PING" => Reply::Status("PONG".to_string()),
        b"INCR" => match request.get(1) {
            Some(key) if request.len() == 2 => {
                match registry.next(&String::from_utf8_lossy(key)) {
                    Ok(id) => Reply::Integer(id),
                    Err(e) => Reply::Error(e.to_string()),
                }
            }
            _ => Reply::Error("invalid arguments".to_string()),
        },
        b"GET" => match request.get(1) {
            Some(key) if request.len() == 2 => {
                match registry.current(&String::from_utf8_lossy(key)) {
                    Ok(id) => Reply::Status(id.to_string()),
                    Err(e) => Reply::Error(e.to_string()),
                }
            }
            _ => Reply::Error("invalid arguments".to_string()),
        },
        _ => Reply::Error("unsupported method.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idgen_proto::engine::MemoryStore;
    use idgen_proto::logsink::LogSink;
    use std::sync::Arc;

    fn registry_with(keys: &[&str]) -> Registry {
        let r = Registry::new(Arc::new(MemoryStore::new()), 100, LogSink::none());
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        r.enable_keys(&keys).unwrap();
        r
    }

    fn req(parts: &[&str]) -> Request {
        parts.iter().map(|p| p.as_bytes().to_vec()).collect()
    }

    #[test]
    fn ping_ignores_extra_arguments() {
        let r = registry_with(&[]);
        assert_eq!(
            dispatch(&r, &req(&["ping", "extra", "args"])),
            Reply::Status("PONG".to_string())
        );
    }

    #[test]
    fn incr_returns_an_integer_reply() {
        let r = registry_with(&["users"]);
        assert_eq!(dispatch(&r, &req(&["INCR", "users"])), Reply::Integer(1));
    }

    #[test]
    fn incr_wrong_arity_is_invalid_arguments() {
        let r = registry_with(&["users"]);
        assert_eq!(
            dispatch(&r, &req(&["INCR"])),
            Reply::Error("invalid arguments".to_string())
        );
    }

    #[test]
    fn incr_unknown_key_surfaces_the_engine_error() {
        let r = registry_with(&["users"]);
        assert_eq!(
            dispatch(&r, &req(&["INCR", "missing"])),
            Reply::Error("key does not exist".to_string())
        );
    }

    #[test]
    fn get_returns_a_status_reply_not_an_integer_reply() {
        let r = registry_with(&["users"]);
        dispatch(&r, &req(&["INCR", "users"]));
        assert_eq!(
            dispatch(&r, &req(&["GET", "users"])),
            Reply::Status("1".to_string())
        );
    }

    #[test]
    fn unknown_command_is_unsupported() {
        let r = registry_with(&[]);
        assert_eq!(
            dispatch(&r, &req(&["FROBNICATE"])),
            Reply::Error("unsupported method.".to_string())
        );
    }

    #[test]
    fn command_name_is_case_insensitive() {
        let r = registry_with(&["users"]);
        assert_eq!(dispatch(&r, &req(&["incr", "users"])), Reply::Integer(1));
    }
}
