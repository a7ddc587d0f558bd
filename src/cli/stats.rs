use anyhow::Result;

use lesion::config::LesionConfig;
use lesion::query::stats::corpus_stats;

/// Print corpus statistics to the terminal.
pub fn run(config: &LesionConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = lesion::db::open_database(&db_path)?;

    let stats = corpus_stats(&conn, Some(&db_path))?;

    println!("Corpus: {}", db_path.display());
    println!("  studies:          {}", stats.studies);
    println!("  term annotations: {}", stats.term_annotations);
    println!("  distinct terms:   {}", stats.distinct_terms);
    println!("  coordinates:      {}", stats.coordinates);
    if stats.vocabularies.is_empty() {
        println!("  vocabularies:     (none)");
    } else {
        println!("  vocabularies:     {}", stats.vocabularies.join(", "));
    }
    println!("  db size:          {} bytes", stats.db_size_bytes);

    Ok(())
}
