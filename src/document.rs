//! Document assembly: a full HTML5 document around head and body
//! content, plus the development-time live-reload script injection.

use anyhow::Result;

use crate::attr::{att, opt_att};
use crate::element::{Element, ToChildren};
use crate::escape::{unsafe_text, SafeHtml};
use crate::meta::opt_get_env;
use crate::node::{raw, Node};
use crate::tags;

pub const DOCTYPE: &str = "<!DOCTYPE html>\n";

/// When set to `1`, `html5_tree` appends a live-reload script tag to
/// the document head.
pub const LIVERELOAD_VAR: &str = "HTWEAVE_LIVERELOAD";
/// Pre-encoded query flags for the live-reload client, e.g.
/// `host=localhost&port=35729`, or `host=…&path=…` behind a proxy.
pub const LIVERELOAD_FLAGS_VAR: &str = "HTWEAVE_LIVERELOAD_FLAGS";

const LIVERELOAD_JS_VERSION: &str = "v4.0.2";

/// The doctype marker as safe markup, for callers assembling
/// documents by hand.
pub fn doctype() -> SafeHtml {
    unsafe_text("<!DOCTYPE html>")
}

/// The environment a development server sets for its child process
/// so that rendered pages connect back to it.
pub fn livereload_env(host: &str, port: u16) -> [(String, String); 2] {
    [
        (
            LIVERELOAD_FLAGS_VAR.to_string(),
            format!("host={host}&port={port}"),
        ),
        (LIVERELOAD_VAR.to_string(), "1".to_string()),
    ]
}

fn livereload_flags() -> Result<Option<String>> {
    let enabled = opt_get_env::<String>(LIVERELOAD_VAR)?
        .map(|v| v == "1")
        .unwrap_or(false);
    if !enabled {
        return Ok(None);
    }
    Ok(Some(
        opt_get_env::<String>(LIVERELOAD_FLAGS_VAR)?.unwrap_or_default(),
    ))
}

/// A script tag whose scriptlet inserts livereload-js with the right
/// protocol for the page.
fn livereload_script_tag(flags: &str) -> Result<Element> {
    let uri = format!(
        "cdn.jsdelivr.net/npm/livereload-js@{LIVERELOAD_JS_VERSION}/dist/livereload.js"
    );
    let scriptlet = [
        "(function(){".to_string(),
        "var s = document.createElement(\"script\");".to_string(),
        format!("s.src = location.protocol + '//{uri}?{flags}';"),
        "document.head.appendChild(s)".to_string(),
        "})()".to_string(),
    ]
    .join("\n");
    tags::script((), raw(unsafe_text(scriptlet)))
}

/// The `html[head[…], body[…]]` tree of a full document. The head
/// always defines the mobile viewport; `title` adds a title element;
/// `head_extra` is spliced in after those. With live reload enabled
/// in the environment, the script tag is appended through the
/// ordinary `append` contract.
pub fn html5_tree(
    title: Option<&str>,
    lang: Option<&str>,
    head_extra: impl ToChildren,
    body_content: impl ToChildren,
) -> Result<Element> {
    let title_el = title.map(|t| tags::title((), t)).transpose()?;
    let mut head_el = tags::head(
        (),
        [
            tags::meta([
                att("name", "viewport"),
                att("content", "width=device-width, initial-scale=1.0"),
            ])?
            .into(),
            Node::from(title_el),
        ],
    )?;
    head_el.append(head_extra)?;
    if let Some(flags) = livereload_flags()? {
        log::debug!("live reload enabled, injecting script tag");
        head_el.append(livereload_script_tag(&flags)?)?;
    }
    let mut html_el = tags::html([opt_att("lang", lang)], head_el)?;
    html_el.append(tags::body((), body_content)?)?;
    Ok(html_el)
}

/// A complete HTML5 document rendered eagerly. For streaming, hold
/// the `html5_tree` result and drive `Renderer::stream` over it.
pub fn html5_document(
    title: Option<&str>,
    lang: Option<&str>,
    head_extra: impl ToChildren,
    body_content: impl ToChildren,
) -> Result<String> {
    let tree = html5_tree(title, lang, head_extra, body_content)?;
    let mut out = String::from(DOCTYPE);
    out.push_str(&tree.render()?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn t_html5_document() {
        let doc = html5_document(
            Some("T"),
            Some("en"),
            (),
            tags::p((), "Hello, world!").unwrap(),
        )
        .unwrap();
        assert_eq!(
            doc,
            "<!DOCTYPE html>\n\
             <html lang=\"en\"><head>\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\"/>\
             <title>T</title></head>\
             <body><p>Hello, world!</p></body></html>"
        );
    }

    #[test]
    fn t_titleless_untagged_document() {
        let doc = html5_document(None, None, (), ()).unwrap();
        assert!(doc.starts_with("<!DOCTYPE html>\n<html><head><meta "));
        assert!(!doc.contains("<title>"));
        assert!(doc.ends_with("<body></body></html>"));
    }

    // One test covers both environment states to keep the env
    // mutation single-threaded.
    #[test]
    fn t_livereload_injection() {
        let tree = html5_tree(None, None, (), ()).unwrap();
        assert!(!tree.render().unwrap().contains("livereload"));

        for (k, v) in livereload_env("localhost", 35729) {
            std::env::set_var(k, v);
        }
        let tree = html5_tree(None, None, (), ()).unwrap();
        let html = tree.render().unwrap();
        std::env::remove_var(LIVERELOAD_VAR);
        std::env::remove_var(LIVERELOAD_FLAGS_VAR);

        assert!(html.contains("<script>(function(){"));
        assert!(html.contains("livereload-js@v4.0.2"));
        assert!(html.contains("host=localhost&port=35729"));
        // the script tag landed inside the head
        let head_end = html.find("</head>").unwrap();
        assert!(html.find("<script>").unwrap() < head_end);
    }
}
