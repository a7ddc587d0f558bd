use anyhow::{Context, Result};
use clap::Args;
use std::time::Duration;

use lesion::config::LesionConfig;
use lesion::query::assemble;
use lesion::query::dissociate::{dissociate, DissociateRequest};
use lesion::query::strategy::MatchConfig;
use lesion::query::types::{Domain, Mode, Selector};
use lesion::query::CancelToken;

#[derive(Debug, Args)]
pub struct DissociateArgs {
    /// Query domain: "terms" or "locations"
    pub domain: Domain,
    /// Selector A (term text, or "x_y_z" for locations)
    #[arg(allow_hyphen_values = true)]
    pub selector_a: String,
    /// Selector B (term text, or "x_y_z" for locations)
    #[arg(allow_hyphen_values = true)]
    pub selector_b: String,
    /// Also compute the reverse direction (B \ A)
    #[arg(long)]
    pub both: bool,
    /// Result cap (defaults to the configured limit)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Spatial neighborhood radius override in mm
    #[arg(long)]
    pub radius: Option<f64>,
    /// Restrict term matching to one vocabulary
    #[arg(long)]
    pub vocabulary: Option<String>,
    /// Emit the annotated JSON envelope instead of a bare id list
    #[arg(long)]
    pub json: bool,
}

/// Run a one-off dissociation from the terminal.
pub fn run(config: &LesionConfig, args: DissociateArgs) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = lesion::db::open_database(&db_path)?;

    let mut selector_a = Selector::parse(args.domain, &args.selector_a)?;
    let mut selector_b = Selector::parse(args.domain, &args.selector_b)?;
    if let Some(radius) = args.radius {
        if let Selector::Point { radius: slot, .. } = &mut selector_a {
            *slot = Some(radius);
        }
        if let Selector::Point { radius: slot, .. } = &mut selector_b {
            *slot = Some(radius);
        }
    }

    let request = DissociateRequest {
        selector_a,
        selector_b,
        mode: if args.both { Mode::Both } else { Mode::OneWay },
        strategy: MatchConfig {
            term: config.term_match(),
            spatial: config.spatial_match(),
        },
        limit: Some(args.limit.unwrap_or(config.query.default_limit)),
        vocabulary: args
            .vocabulary
            .clone()
            .or_else(|| config.storage.vocabulary.clone()),
    };

    let cancel = match config.query.timeout_ms {
        0 => CancelToken::none(),
        ms => CancelToken::with_deadline(Duration::from_millis(ms)),
    };

    let result = dissociate(&conn, &request, &cancel)?;

    if args.json {
        let payload = assemble::payload(
            args.domain,
            &args.selector_a,
            &args.selector_b,
            &result,
            request.limit,
        );
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize payload")?
        );
        return Ok(());
    }

    let studies = assemble::flat(&result);
    if studies.is_empty() {
        println!("No studies in {} \\ {}.", args.selector_a, args.selector_b);
    } else {
        println!("{} \\ {}:", args.selector_a, args.selector_b);
        for id in &studies {
            println!("  {id}");
        }
    }

    if let Some(reverse) = &result.reverse {
        println!("{} \\ {}:", args.selector_b, args.selector_a);
        if reverse.is_empty() {
            println!("  (none)");
        }
        for id in reverse {
            println!("  {id}");
        }
    }

    Ok(())
}
