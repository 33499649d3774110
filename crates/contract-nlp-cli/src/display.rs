//! Plain-text rendering of query results, workflow turns and the
//! attribute table.

use contract_nlp_core::{AttributeConfig, AttributeSummary};
use contract_nlp_engine::{Turn, WorkflowResult};
use contract_nlp_intent::QueryResult;

const LABEL: usize = 22;

// ── Query results ──

pub fn print_query(result: &QueryResult) {
    println!("=== {} ===", result.classification.action_type);
    println!("{}", result.original_input);
    println!();

    print_section(
        "Classification",
        &[
            ("query_type", result.query_type().as_str().to_string()),
            ("action", result.classification.action_type.to_string()),
            ("confidence", format!("{:.2}", result.classification.confidence)),
            (
                "feature_score",
                result
                    .feature_score
                    .map(|s| format!("{s:.2}"))
                    .unwrap_or_default(),
            ),
        ],
    );

    if result.corrected_input != result.original_input {
        let corrections: Vec<String> = result
            .corrections
            .iter()
            .map(|c| format!("{} -> {} ({:.2})", c.from, c.to, c.confidence))
            .collect();
        print_section(
            "Normalisation",
            &[
                ("corrected", result.corrected_input.clone()),
                ("corrections", corrections.join(", ")),
            ],
        );
    }

    let header = &result.header;
    print_section(
        "Header",
        &[
            ("contract_number", header.contract_number.clone().unwrap_or_default()),
            ("part_number", header.part_number.clone().unwrap_or_default()),
            ("customer_number", header.customer_number.clone().unwrap_or_default()),
            ("customer_name", header.customer_name.clone().unwrap_or_default()),
            ("created_by", header.created_by.clone().unwrap_or_default()),
        ],
    );

    if !result.entities.is_empty() {
        println!("Filters");
        for e in &result.entities {
            println!("  {:<LABEL$} {} {}  ({})", e.attribute, e.operation, e.value, e.source.as_str());
        }
        println!();
    }

    print_section("Display", &[("fields", result.display_fields.join(", "))]);

    if !result.issues.is_empty() {
        println!("Issues");
        for issue in &result.issues {
            println!("  {:<LABEL$} {}", issue.code, issue.message);
        }
        println!();
    }

    println!("Confidence");
    println!("{}", result.confidence.report());
}

// ── Workflow ──

pub fn print_turn(turn: &Turn) {
    match turn {
        Turn::Query { result } => print_query(result),
        Turn::Workflow { result } => print_workflow(result),
        Turn::Completed { result, query } => {
            print_workflow(result);
            print_query(query);
        }
    }
}

pub fn print_workflow(result: &WorkflowResult) {
    match result {
        WorkflowResult::RequiresInput {
            attribute,
            message,
            completed_steps,
            ..
        } => {
            println!("[{attribute}] {message}");
            if !completed_steps.is_empty() {
                println!("  {:<LABEL$} {}", "completed", completed_steps.join(", "));
            }
        }
        WorkflowResult::Complete {
            message,
            data,
            merged_query,
            ..
        } => {
            println!("{message}");
            for (attribute, value) in data {
                println!("  {attribute:<LABEL$} {value}");
            }
            println!("  {:<LABEL$} {merged_query}", "query");
        }
        WorkflowResult::ChainBreak { message } => println!("{message}"),
        WorkflowResult::Error { message } => eprintln!("error: {message}"),
    }
    println!();
}

// ── Attributes ──

pub fn print_attributes(summary: &AttributeSummary, attributes: &[AttributeConfig]) {
    println!("{summary}");
    println!();
    for attr in attributes {
        let flag = if attr.required { "required" } else { "optional" };
        println!("{} ({}, {})", attr.name, attr.data_type.as_str(), flag);
        println!("  {:<LABEL$} {}", "prompt", attr.prompt);
        println!("  {:<LABEL$} {}..{}", "length", attr.min_length, attr.max_length);
        if let Some(pattern) = &attr.validation_pattern {
            println!("  {:<LABEL$} {pattern}", "pattern");
        }
        if !attr.allowed_values.is_empty() {
            println!("  {:<LABEL$} {}", "allowed", attr.allowed_values.join(", "));
        }
    }
}

fn print_section(header: &str, rows: &[(&str, String)]) {
    if rows.iter().all(|(_, v)| v.is_empty()) {
        return;
    }
    println!("{header}");
    for (label, value) in rows {
        if value.is_empty() {
            continue;
        }
        println!("  {label:<LABEL$} {value}");
    }
    println!();
}
