//! Server-side rendering of the single page: form, optional result, history.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::history::History;
use crate::result::SentimentResult;

const FORM_FIELD: &str = "text_input";

pub fn render_page(result: Option<&SentimentResult>, history: &History) -> String {
    let bg = result.map(|r| r.bg_class).unwrap_or("bg-neutral");
    let prefill = result.map(|r| r.text.as_str()).unwrap_or("");

    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Sentiment Analyzer</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body class="{bg}">
<main class="container">
<h1>Sentiment Analyzer</h1>
<form method="post" action="/">
<textarea name="{FORM_FIELD}" rows="6" placeholder="Type or paste some text...">{prefill}</textarea>
<button type="submit">Analyze</button>
</form>
"#,
        bg = encode_double_quoted_attribute(bg),
        prefill = encode_text(prefill),
    );

    if let Some(r) = result {
        render_result(&mut html, r);
    }
    render_history(&mut html, history);

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_result(html: &mut String, r: &SentimentResult) {
    let _ = write!(
        html,
        r#"<section class="result">
<div class="emoji">{emoji}</div>
<h2 class="{color}">{label}</h2>
<div class="meter">
<span>Polarity {polarity:.2}</span>
<div class="bar"><div class="fill fill-{lower}" style="width: {pp:.0}%"></div></div>
</div>
<div class="meter">
<span>Subjectivity {subjectivity:.2}</span>
<div class="bar"><div class="fill fill-primary" style="width: {sp:.0}%"></div></div>
</div>
"#,
        emoji = r.emoji,
        color = r.color_class,
        label = r.label,
        polarity = r.polarity,
        lower = r.label_lower,
        pp = r.polarity_percent,
        subjectivity = r.subjectivity,
        sp = r.subjectivity_percent,
    );

    if !r.keywords.is_empty() {
        html.push_str("<h3>Keywords</h3>\n<ul class=\"keywords\">\n");
        for k in &r.keywords {
            let _ = writeln!(html, "<li>{}</li>", encode_text(k));
        }
        html.push_str("</ul>\n");
    }

    if !r.sentences.is_empty() {
        html.push_str("<h3>Sentences</h3>\n<ol class=\"sentences\">\n");
        for s in &r.sentences {
            let _ = writeln!(
                html,
                r#"<li class="sentence-{lower}">{text} <small>{label} ({polarity:.2})</small></li>"#,
                lower = s.label.lower(),
                text = encode_text(&s.text),
                label = s.label,
                polarity = s.polarity,
            );
        }
        html.push_str("</ol>\n");
    }

    html.push_str("</section>\n");
}

fn render_history(html: &mut String, history: &History) {
    if history.is_empty() {
        return;
    }
    html.push_str("<section class=\"history\">\n<h3>Recent</h3>\n<ul>\n");
    for e in history.iter() {
        let _ = writeln!(
            html,
            r#"<li id="h-{id}">{emoji} {preview} <small>{label} ({polarity:.2})</small></li>"#,
            id = encode_double_quoted_attribute(&e.id),
            emoji = e.emoji,
            preview = encode_text(&e.text_preview),
            label = e.label,
            polarity = e.polarity,
        );
    }
    html.push_str("</ul>\n</section>\n");
}
