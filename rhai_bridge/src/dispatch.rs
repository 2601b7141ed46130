use cannoli_core::{Request, Response};
use liblogger::log_debug;
use rhai::Dynamic;

use crate::interpreter::{display_value, Interpreter};

/// Method called on the context after the handler returns.
pub const RESPONSE_METHOD: &str = "_build_response";

/// Fixed message for a context that could not be built.
pub const CONTEXT_FAILURE: &str = "Failed to create Cannoli object";

impl Interpreter {
    /// Run one request through `handler`.
    ///
    /// The handler receives the context as its only argument; its return
    /// value is ignored. The response is whatever `_build_response` returns
    /// for that same context.
    pub fn dispatch(&mut self, handler: &str, request: &Request) -> Response {
        let mut context = match self.create_context(request) {
            Ok(context) => context,
            Err(err) => {
                self.note_error("context", &err.to_string());
                return Response::internal_error(CONTEXT_FAILURE);
            }
        };

        if let Err(err) = self.call_function(handler, (context.clone(),)) {
            let message = err.to_string();
            self.note_error("handler", &message);
            return Response::internal_error(message);
        }

        match self.call_method(&mut context, RESPONSE_METHOD) {
            Ok(value) => {
                log_debug!(&format!("{} {} handled by {}", request.method, request.path, handler));
                Response::from_wire(&display_value(value))
            }
            Err(err) => {
                let message = err.to_string();
                self.note_error("response", &message);
                Response::internal_error(message)
            }
        }
    }

    /// Call `name` with four string arguments and return its value as the
    /// response. A unit return abstains.
    pub fn call_positional(&mut self, name: &str, args: [String; 4]) -> Response {
        let [a1, a2, a3, a4] = args;
        let call = self.call_function(
            name,
            (
                Dynamic::from(a1),
                Dynamic::from(a2),
                Dynamic::from(a3),
                Dynamic::from(a4),
            ),
        );
        match call {
            Ok(value) => Response::from_wire(&display_value(value)),
            Err(err) => {
                let message = err.to_string();
                self.note_error("call", &message);
                Response::internal_error(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpreterConfig;
    use cannoli_core::HeaderMap;

    const HANDLERS: &str = r#"
        fn hello(c) {
            c.write("hello " + c["method"] + " " + c["path"]);
        }

        fn echo_headers(c) {
            let h = c["headers"];
            c.write(`${h["content-type"]}|${h["x-foo"]}|${h.len()}`);
        }

        fn fail(c) {
            throw "oops at line 3";
        }

        fn not_found(c) {
            c.status(404);
            c.write("no such thing");
        }

        fn quoted_ok(c) {
            c.status("200");
            c.write("fine");
        }

        fn quoted_not_found(c) {
            c.status("404");
            c.write("gone");
        }

        fn silent(c) { }

        fn returns_value(c) { "ignored" }

        fn route_name(method, path, info, body) {
            method + " " + path + " " + info + " " + body
        }

        fn nothing(a, b, c, d) { }
    "#;

    fn interpreter() -> Interpreter {
        let mut interp = Interpreter::new(&InterpreterConfig::default()).unwrap();
        interp.load_cannoli("").unwrap();
        interp.eval(HANDLERS).unwrap();
        interp
    }

    #[test]
    fn handler_writes_body() {
        let mut interp = interpreter();
        let response = interp.dispatch("hello", &Request::new("GET", "/greet"));
        assert_eq!(response, Response::body("hello GET /greet"));
    }

    #[test]
    fn headers_arrive_as_lowercased_map() {
        let mut interp = interpreter();
        let request = Request::default()
            .with_headers(HeaderMap::parse("Content-Type: text/plain\nX-Foo: bar\r\n"));
        assert_eq!(
            interp.dispatch("echo_headers", &request).to_wire(),
            "text/plain|bar|2"
        );
    }

    #[test]
    fn handler_error_becomes_status_500() {
        let mut interp = interpreter();
        let wire = interp.dispatch("fail", &Request::default()).to_wire();
        assert!(wire.starts_with("STATUS:500:"), "{wire}");
        assert!(wire.contains("oops"), "{wire}");
        assert!(interp.last_error().unwrap().contains("oops"));
    }

    #[test]
    fn missing_handler_is_a_handler_error() {
        let mut interp = interpreter();
        let wire = interp.dispatch("no_such_handler", &Request::default()).to_wire();
        assert!(wire.starts_with("STATUS:500:"), "{wire}");
        assert!(wire.contains("no_such_handler"), "{wire}");
    }

    #[test]
    fn invalid_handler_name_is_rejected() {
        let mut interp = interpreter();
        let wire = interp.dispatch("hello(); 1", &Request::default()).to_wire();
        assert_eq!(wire, "STATUS:500:invalid name 'hello(); 1'");
    }

    #[test]
    fn non_ok_status_uses_sentinel() {
        let mut interp = interpreter();
        assert_eq!(
            interp.dispatch("not_found", &Request::default()),
            Response::status(404, "no such thing")
        );
    }

    #[test]
    fn untouched_context_abstains_and_return_value_is_ignored() {
        let mut interp = interpreter();
        assert!(interp.dispatch("silent", &Request::default()).is_abstain());
        assert!(interp.dispatch("returns_value", &Request::default()).is_abstain());
    }

    #[test]
    fn constructor_failure_has_fixed_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cannoli_broken.rhai");
        std::fs::write(&path, "fn new_cannoli(fields) { throw \"nope\"; }").unwrap();

        let mut interp = Interpreter::new(&InterpreterConfig::default()).unwrap();
        interp.load_cannoli(path.to_str().unwrap()).unwrap();
        interp.eval("fn hello(c) { }").unwrap();

        assert_eq!(
            interp.dispatch("hello", &Request::default()).to_wire(),
            "STATUS:500:Failed to create Cannoli object"
        );
    }

    #[test]
    fn unit_constructor_counts_as_failure() {
        let mut interp = Interpreter::new(&InterpreterConfig::default()).unwrap();
        interp.eval("fn new_cannoli(fields) { } fn hello(c) { }").unwrap();
        assert_eq!(
            interp.dispatch("hello", &Request::default()).to_wire(),
            "STATUS:500:Failed to create Cannoli object"
        );
    }

    #[test]
    fn no_context_module_loaded() {
        let mut interp = Interpreter::new(&InterpreterConfig::default()).unwrap();
        interp.eval("fn hello(c) { }").unwrap();
        assert_eq!(
            interp.dispatch("hello", &Request::default()).to_wire(),
            "STATUS:500:Failed to create Cannoli object"
        );
    }

    #[test]
    fn response_builder_error_becomes_status_500() {
        let mut interp = interpreter();
        interp
            .eval("fn _build_response() { throw \"cannot render\"; }")
            .unwrap();
        let wire = interp.dispatch("hello", &Request::default()).to_wire();
        assert!(wire.starts_with("STATUS:500:cannot render"), "{wire}");
    }

    #[test]
    fn interpreter_survives_many_failures() {
        let mut interp = interpreter();
        for _ in 0..1000 {
            let wire = interp.dispatch("fail", &Request::default()).to_wire();
            assert!(wire.starts_with("STATUS:500:"));
        }
        assert_eq!(
            interp.dispatch("hello", &Request::new("GET", "/")).to_wire(),
            "hello GET /"
        );
    }

    #[test]
    fn qualified_handler_names_resolve_through_modules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("App")).unwrap();
        std::fs::write(
            dir.path().join("App").join("Routes.rhai"),
            "fn index(c) { c[\"response_body\"] = \"index of \" + c[\"path\"]; }",
        )
        .unwrap();

        let mut interp = interpreter();
        interp.add_include_path(dir.path()).unwrap();
        interp.use_module("App::Routes").unwrap();

        assert_eq!(
            interp.dispatch("App::Routes::index", &Request::new("GET", "/docs")).to_wire(),
            "index of /docs"
        );
    }

    #[test]
    fn positional_call() {
        let mut interp = interpreter();
        let args = ["GET", "/a", "/b", "{}"].map(String::from);
        assert_eq!(
            interp.call_positional("route_name", args.clone()).to_wire(),
            "GET /a /b {}"
        );
        assert!(interp.call_positional("nothing", args.clone()).is_abstain());
        assert!(interp
            .call_positional("fail", args)
            .to_wire()
            .starts_with("STATUS:500:"));
    }

    #[test]
    fn string_status_codes_are_honoured() {
        let mut interp = interpreter();
        assert_eq!(
            interp.dispatch("quoted_ok", &Request::default()),
            Response::body("fine")
        );
        assert_eq!(
            interp.dispatch("quoted_not_found", &Request::default()),
            Response::status(404, "gone")
        );
    }

    #[test]
    fn handler_file_imports_are_available_at_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("util.rhai"), "fn shout(s) { s.to_upper() }").unwrap();
        let app = dir.path().join("app.rhai");
        std::fs::write(
            &app,
            "import \"util\" as util;\nfn handle(c) { c.write(util::shout(\"hi \" + c[\"path\"])); }",
        )
        .unwrap();

        let mut interp = interpreter();
        interp.add_include_path(dir.path()).unwrap();
        interp.do_file(app.to_str().unwrap()).unwrap();

        assert_eq!(
            interp.dispatch("handle", &Request::new("GET", "/home")),
            Response::body("HI /HOME")
        );
    }
}
