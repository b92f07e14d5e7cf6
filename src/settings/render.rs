//! Settings page rendering

use crate::settings::types::{
    SettingsView, AUTH_KEY, EXTENDED_DEBUG, HOST, LINKBASE, LOGIN, PASSWORD, RETRIES, TRUST_ALL,
    USE_TOKEN,
};
use std::fmt::Write;

/// Turns a settings view into an HTML page
pub trait Renderer: Send + Sync {
    fn render(&self, view: &SettingsView) -> String;
}

/// Built-in settings page
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, view: &SettingsView) -> String {
        let mut page = String::with_capacity(4096);
        page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str("<title>Issue tracker integration</title>\n</head>\n<body>\n");
        page.push_str("<h1>Issue tracker integration</h1>\n");

        match view.just_saved {
            0 => page.push_str("<div class=\"notice success\">Settings saved.</div>\n"),
            -2 => page.push_str(concat!(
                "<div class=\"notice error\">Could not connect to the tracker ",
                "with these settings. Nothing was saved.</div>\n",
            )),
            _ => {}
        }

        let _ = writeln!(
            page,
            "<form method=\"post\" data-base-url=\"{}\" data-just-saved=\"{}\">",
            escape(&view.base_url),
            view.just_saved
        );
        text_input(&mut page, HOST, "Tracker URL", "text", &view.host);
        text_input(&mut page, LINKBASE, "Link base", "text", &view.linkbase);
        checkbox(&mut page, USE_TOKEN, "Use token authorization", view.use_token);
        text_input(&mut page, AUTH_KEY, "Token", "text", &view.auth_key);
        text_input(&mut page, LOGIN, "Login", "text", &view.login);
        text_input(&mut page, PASSWORD, "Password", "password", &view.password);
        text_input(&mut page, RETRIES, "Retries", "number", &view.retries);
        checkbox(&mut page, TRUST_ALL, "Trust all certificates", view.trust_all);
        checkbox(&mut page, EXTENDED_DEBUG, "Extended debug", view.extended_debug);
        page.push_str("<button type=\"submit\">Save</button>\n</form>\n</body>\n</html>\n");
        page
    }
}

fn text_input(page: &mut String, name: &str, label: &str, kind: &str, value: &str) {
    let _ = writeln!(
        page,
        concat!(
            "<label for=\"{name}\">{label}</label>\n",
            "<input type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{value}\">",
        ),
        name = name,
        label = label,
        kind = kind,
        value = escape(value),
    );
}

fn checkbox(page: &mut String, name: &str, label: &str, checked: bool) {
    let _ = writeln!(
        page,
        "<label><input type=\"checkbox\" name=\"{name}\"{}> {label}</label>",
        if checked { " checked" } else { "" }
    );
}

/// Escape text for HTML attribute and element content
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
