//! CLI command implementations

pub mod accounts;
pub mod assets;
pub mod holdings;
pub mod insider;
pub mod pump;
pub mod trades;
pub mod wash;

/// Bulk-loading note printed when --elasticsearch is passed. Ingestion
/// itself is handled by the external loader tooling.
pub fn print_elasticsearch_note(file: &str, index: &str, id_field: &str) {
    println!();
    println!("Elasticsearch loading is delegated to the bulk loader:");
    println!("  file:     {}", file);
    println!("  index:    {}", index);
    println!("  id field: {}", id_field);
}
