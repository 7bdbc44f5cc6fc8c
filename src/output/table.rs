use unicode_width::UnicodeWidthStr;

use crate::catalog::{self, CheckedOption};
use crate::models::{CacheStats, Question};
use crate::output::question_href;
use crate::page::{FilterPanel, PageView};

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Print the browse page: status line, then one card per question.
pub fn print_page(view: &PageView<'_>, limit: usize) {
    println!("{}\n", view.location);

    if let Some(err) = view.error {
        eprintln!("Warning: could not refresh results: {err}");
    }
    if view.is_previous_data {
        eprintln!("(showing results for the previous filters)");
    } else if let Some(at) = view.cached_at {
        eprintln!("(showing cached results from {at})");
    }

    let Some(questions) = view.questions else {
        println!("Loading...");
        return;
    };

    if questions.is_empty() {
        println!("Nothing found.");
        if view.has_filters {
            println!("Try changing your search criteria.");
        }
        return;
    }

    let shown = questions.len().min(limit);
    println!(
        "{} question{}{}:\n",
        questions.len(),
        plural(questions.len()),
        if shown < questions.len() {
            format!(" (showing {shown})")
        } else {
            String::new()
        }
    );

    for q in questions.iter().take(limit) {
        print_question_card(q);
    }
}

/// One question card.
pub fn print_question_card(q: &Question) {
    let content = q.content.replace('\n', " ");
    println!("  {}", truncate(&content, 76));
    println!(
        "  {} · {} · {} · {} · {}",
        q.company,
        q.location,
        q.role,
        catalog::question_type_label(q.question_type),
        q.seen_at.format("%b %Y"),
    );
    println!(
        "  ▲ {}  answers: {}  received: {}",
        q.num_votes, q.num_answers, q.received_count
    );
    println!("  {}\n", question_href(&q.id, &q.content));
}

/// Print the filter sidebar and sort bar.
pub fn print_filter_panel(panel: &FilterPanel) {
    print_options("Sort order", &panel.sort_order);
    print_options("Sort type", &panel.sort_type);
    print_options("Company", &panel.companies);
    print_options("Question types", &panel.question_types);
    print_options("Question age", &panel.question_age);
    print_options("Roles", &panel.roles);
    print_options("Location", &panel.locations);
}

/// Print one option list with check marks.
pub fn print_options(label: &str, options: &[CheckedOption]) {
    println!("{label}:");
    if options.is_empty() {
        println!("  (no matching options)");
    }
    for o in options {
        let mark = if o.checked { "x" } else { " " };
        if o.label == o.value {
            println!("  [{mark}] {}", o.label);
        } else {
            println!("  [{mark}] {:<24} {}", o.label, o.value);
        }
    }
    println!();
}

/// Print cache stats.
pub fn print_cache_stats(stats: &CacheStats) {
    println!("Cache Statistics:");
    println!("  Entries:  {}", stats.entries);
    println!("  Hits:     {}", stats.hits);
    println!("  Oldest:   {}", stats.oldest.as_deref().unwrap_or("-"));
    println!("  Newest:   {}", stats.newest.as_deref().unwrap_or("-"));
    println!("  DB Size:  {}", format_bytes(stats.db_size_bytes));
    if !stats.procedures.is_empty() {
        println!("\n  Procedures:");
        for pc in &stats.procedures {
            println!("    {:<44} {}", pc.procedure, pc.count);
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
