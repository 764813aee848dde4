use crate::infra::{default_risk_config, InMemoryObjectStorage, InMemoryRagGateway};
use clap::Args;
use demystifier::error::AppError;
use demystifier::pipeline::DocumentService;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Question to ask about the demo contract after summarization
    #[arg(long, default_value = "Does the lease renew automatically?")]
    pub(crate) question: String,
    /// Skip the follow-up question portion of the demo
    #[arg(long)]
    pub(crate) skip_question: bool,
}

/// Walk the full pipeline offline: mint an upload slot, summarize the demo
/// contract, and ask a follow-up question, printing each stage.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = Arc::new(DocumentService::new(
        Arc::new(InMemoryRagGateway),
        Arc::new(InMemoryObjectStorage::default()),
        default_risk_config(),
        "demystifier-demo",
    )?);

    println!("== Legal Document Demystifier demo ==\n");

    let slot = service.create_upload_slot()?;
    println!("Upload slot");
    println!("  object name : {}", slot.object_name);
    println!("  signed URL  : {}\n", slot.upload_url);

    let summary = service.process_document(&slot.object_name, None)?;
    println!("Document summary");
    if let Some(title) = &summary.title {
        println!("  title        : {title}");
    }
    println!("  overall risk : {:.1}", summary.overall_risk_score);
    println!("  summary      : {}\n", summary.summary);

    println!("Clauses ({})", summary.clauses.len());
    for clause in &summary.clauses {
        println!(
            "  [{}] composite {:.1} (model {:.1} / rules {:.1})",
            clause.risk_category.label(),
            clause.composite_score,
            clause.model_risk_estimate,
            clause.rule_risk_score,
        );
        println!("      {}", clause.simplified_text);
        for provenance in &clause.provenance {
            match provenance.page {
                Some(page) => println!("      source: {} (page {page})", provenance.text),
                None => println!("      source: {}", provenance.text),
            }
        }
    }

    if !args.skip_question {
        let corpus = summary.rag_corpus_name.as_deref().unwrap_or_default();
        let answer = service.answer_question(corpus, &args.question)?;
        println!("\nQ: {}", args.question);
        println!("A: {}", answer.answer);
        for evidence in &answer.evidence {
            println!("   cited: {}", evidence.text);
        }
    }

    service.discard_document(&slot.object_name)?;
    println!("\nUploaded document discarded; demo complete.");
    Ok(())
}
