//! Job result export (spec.md §6): JSON is the full `data` object; CSV is one
//! row per keyword.

use crate::core::types::JobResult;
use crate::error::AppError;

pub fn to_json(result: &JobResult) -> Result<String, AppError> {
    serde_json::to_string_pretty(result).map_err(|e| AppError::Internal(e.into()))
}

const CSV_HEADER: &str = "Cluster ID,Pillar Topic,Keyword,Search Volume,Competition,CPC Low,CPC High,Cluster Value Score,Cluster Total Volume";

/// One row per keyword (spec.md §8 S4): header + one row per keyword across
/// every cluster, `Cluster Value Score` formatted to 2 decimals.
pub fn to_csv(result: &JobResult) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for cluster in &result.clusters {
        for keyword in &cluster.keywords {
            out.push_str(&format!(
                "{},{},{},{},{},{:.2},{:.2},{:.2},{}\n",
                cluster.id,
                csv_escape(&cluster.pillar_topic),
                csv_escape(&keyword.text),
                keyword.search_volume,
                competition_label(keyword.competition),
                keyword.cpc_low,
                keyword.cpc_high,
                cluster.cluster_value_score,
                cluster.total_search_volume,
            ));
        }
    }
    out
}

fn competition_label(c: crate::core::types::Competition) -> &'static str {
    match c {
        crate::core::types::Competition::Low => "low",
        crate::core::types::Competition::Medium => "medium",
        crate::core::types::Competition::High => "high",
        crate::core::types::Competition::Unknown => "unknown",
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cluster, Competition, Keyword};

    fn result_with_two_clusters() -> JobResult {
        let a = Cluster::new(
            "seo".into(),
            vec![
                Keyword { text: "seo services".into(), search_volume: 100, competition: Competition::High, cpc_low: 1.0, cpc_high: 2.0 },
                Keyword { text: "seo audit".into(), search_volume: 50, competition: Competition::Medium, cpc_low: 0.5, cpc_high: 1.0 },
            ],
            "hybrid",
        );
        let b = Cluster::new(
            "marketing".into(),
            vec![Keyword { text: "content marketing".into(), search_volume: 80, competition: Competition::Low, cpc_low: 0.2, cpc_high: 0.4 }],
            "hybrid",
        );
        JobResult { keyword_count: 3, total_search_volume: 230, clusters: vec![a, b] }
    }

    #[test]
    fn csv_has_header_plus_one_row_per_keyword() {
        let result = result_with_two_clusters();
        let csv = to_csv(&result);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
    }

    #[test]
    fn json_export_preserves_keyword_count() {
        let result = result_with_two_clusters();
        let json = to_json(&result).unwrap();
        let parsed: JobResult = serde_json::from_str(&json).unwrap();
        let total: usize = parsed.clusters.iter().map(|c| c.keyword_count()).sum();
        assert_eq!(total, result.keyword_count);
    }
}
