//! k6 脚本生成
//!
//! Renders the IR as JavaScript. The output is unindented; the formatter
//! lays it out afterwards.

use std::fmt::{self, Write};
use serde_json::Value;
use tracing::warn;
use crate::dsl::Executor;
use crate::environment::{Environment, unresolved_tokens};
use crate::ir::{self, Check, HttpRequestStep, KeyValue, Step};

/// Turn a scenario name into a JavaScript identifier.
///
/// Words are split on spaces, stripped to `[A-Za-z0-9_]` and camel-cased.
/// The result is prefixed with `_` unless it starts with a letter or `_`,
/// so empty and numeric names are still valid.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .split(' ')
        .map(|part| {
            part.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(index, part)| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) if index == 0 => first.to_ascii_lowercase().to_string() + chars.as_str(),
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    match sanitized.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => sanitized,
        _ => format!("_{}", sanitized),
    }
}

/// Render `test` against `environment`.
pub fn emit_script(environment: &Environment, test: &ir::Test, warn_unresolved: bool) -> Result<String, fmt::Error> {
    let mut emitter = Emitter {
        environment,
        warn_unresolved,
        out: String::new(),
    };
    emitter.script(test)?;
    Ok(emitter.out)
}

struct Emitter<'a> {
    environment: &'a Environment,
    warn_unresolved: bool,
    out: String,
}

impl Emitter<'_> {
    fn script(&mut self, test: &ir::Test) -> fmt::Result {
        writeln!(self.out, "import http from \"k6/http\";")?;
        writeln!(self.out, "import {{ check, group, sleep }} from \"k6\";")?;
        writeln!(self.out)?;

        writeln!(self.out, "export const options = {{")?;
        writeln!(self.out, "scenarios: {{")?;
        for scenario in &test.scenarios {
            self.scenario_options(scenario)?;
        }
        writeln!(self.out, "}},")?;
        writeln!(self.out, "}};")?;

        for scenario in &test.scenarios {
            writeln!(self.out)?;
            self.scenario(scenario)?;
        }
        Ok(())
    }

    fn function_name(&self, scenario: &ir::Scenario) -> String {
        sanitize_name(&self.substitute(&scenario.name))
    }

    fn scenario_options(&mut self, scenario: &ir::Scenario) -> fmt::Result {
        let exec = self.function_name(scenario);

        writeln!(self.out, "{}: {{", exec)?;
        match &scenario.executor {
            Executor::ConstantVus { vus, duration } => {
                let duration = self.string(duration);
                writeln!(self.out, "executor: \"constant-vus\",")?;
                writeln!(self.out, "vus: {},", vus)?;
                writeln!(self.out, "duration: {},", duration)?;
            }
            Executor::RampingVus { start_vus, stages } => {
                writeln!(self.out, "executor: \"ramping-vus\",")?;
                if let Some(start_vus) = start_vus {
                    writeln!(self.out, "startVUs: {},", start_vus)?;
                }
                writeln!(self.out, "stages: [")?;
                for stage in stages {
                    let duration = self.string(&stage.duration);
                    writeln!(self.out, "{{ target: {}, duration: {} }},", stage.target, duration)?;
                }
                writeln!(self.out, "],")?;
            }
        }
        writeln!(self.out, "exec: {},", js_string(&exec))?;
        writeln!(self.out, "}},")
    }

    fn scenario(&mut self, scenario: &ir::Scenario) -> fmt::Result {
        let function = self.function_name(scenario);
        writeln!(self.out, "export function {}() {{", function)?;
        writeln!(self.out, "let response = null;")?;
        self.steps(&scenario.steps)?;
        writeln!(self.out, "}}")
    }

    fn steps(&mut self, steps: &[Step]) -> fmt::Result {
        for step in steps {
            writeln!(self.out)?;
            self.step(step)?;
        }
        Ok(())
    }

    fn step(&mut self, step: &Step) -> fmt::Result {
        match step {
            Step::HttpRequest(request) => {
                let call = self.request(request);
                writeln!(self.out, "{};", call)
            }
            Step::Group { name, steps } => {
                let name = self.string(name);
                writeln!(self.out, "group({}, () => {{", name)?;
                self.steps(steps)?;
                writeln!(self.out, "}});")
            }
            Step::Check { target, checks } => {
                let call = self.request(target);
                writeln!(self.out, "response = {};", call)?;
                writeln!(self.out, "check(response, {{")?;
                for check in checks {
                    self.check(check)?;
                }
                writeln!(self.out, "}});")
            }
            Step::Sleep { seconds } => writeln!(self.out, "sleep({});", seconds),
        }
    }

    fn check(&mut self, check: &Check) -> fmt::Result {
        match check {
            Check::HasStatus { status } => writeln!(
                self.out,
                "{}: (r) => r.status === {},",
                js_string(&format!("status is {}", status)),
                status
            ),
            Check::BodyContains { value } => {
                let value = self.substitute(value);
                writeln!(
                    self.out,
                    "{}: (r) => r.body.includes({}),",
                    js_string(&format!("body contains {}", value)),
                    js_string(&value)
                )
            }
        }
    }

    /// The request call expression, without the trailing semicolon.
    fn request(&self, request: &HttpRequestStep) -> String {
        let url = js_string(&self.url(request));
        let method = request.method.to_lowercase();

        match (shorthand(&method), request.headers.is_empty()) {
            (Some(function), true) => format!("http.{}({})", function, url),
            (_, true) => format!("http.request({}, {})", js_string(&method.to_uppercase()), url),
            (_, false) => format!(
                "http.request({}, {}, null, {{ headers: {{ {} }} }})",
                js_string(&method.to_uppercase()),
                url,
                self.headers(&request.headers)
            ),
        }
    }

    fn headers(&self, headers: &[KeyValue]) -> String {
        headers
            .iter()
            .map(|header| format!("{}: {}", js_string(&header.name), self.string(&header.value)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Substituted URL with the declared parameters appended as a query string.
    fn url(&self, request: &HttpRequestStep) -> String {
        let mut url = self.substitute(&request.url);
        if request.parameters.is_empty() {
            return url;
        }

        let query = request
            .parameters
            .iter()
            .map(|p| format!("{}={}", encode_component(&p.name), encode_component(&self.substitute(&p.value))))
            .collect::<Vec<_>>()
            .join("&");

        if !url.contains('?') {
            url.push('?');
        } else if !url.ends_with('?') && !url.ends_with('&') {
            url.push('&');
        }
        url.push_str(&query);
        url
    }

    fn substitute(&self, text: &str) -> String {
        let substituted = self.environment.substitute(text);
        if self.warn_unresolved {
            for token in unresolved_tokens(&substituted) {
                warn!("no value for variable `{}` in environment `{}`", token, self.environment.name);
            }
        }
        substituted
    }

    /// Substituted and quoted.
    fn string(&self, text: &str) -> String {
        js_string(&self.substitute(text))
    }
}

/// k6 helpers that take the URL as their first argument.
fn shorthand(method: &str) -> Option<&'static str> {
    match method {
        "get" => Some("get"),
        "post" => Some("post"),
        "put" => Some("put"),
        "patch" => Some("patch"),
        "delete" | "del" => Some("del"),
        "head" => Some("head"),
        "options" => Some("options"),
        _ => None,
    }
}

/// A double-quoted JavaScript string literal.
fn js_string(text: &str) -> String {
    Value::from(text).to_string()
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_component(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
