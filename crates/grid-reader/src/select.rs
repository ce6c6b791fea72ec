//! Variable selection.
//!
//! Granules carry many datasets. When the caller does not name one, the
//! reader resolves a variable from the product's candidate paths by trying
//! each [`Strategy`] in order. The result depends only on the candidate list
//! and the order of the available names.

/// Lowercase fragments that mark a variable as worth rendering.
pub const KEYWORDS: [&str; 6] = ["ndvi", "evi", "snow", "albedo", "nadir", "reflectance"];

/// How a variable was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A candidate path is present verbatim
    Exact,
    /// An available name ends with a candidate's leaf component
    Suffix,
    /// An available name contains a domain keyword
    Keyword,
    /// Nothing matched; the first available variable
    First,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Strategy::Exact => "exact",
            Strategy::Suffix => "suffix",
            Strategy::Keyword => "keyword",
            Strategy::First => "first",
        };
        f.write_str(s)
    }
}

/// A resolved variable name together with the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub strategy: Strategy,
}

/// Leaf component of a slash-separated variable path.
pub fn leaf(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Exact match of any candidate, in candidate order.
pub fn match_exact(candidates: &[&str], available: &[String]) -> Option<String> {
    candidates
        .iter()
        .find(|c| available.iter().any(|a| a == *c))
        .map(|c| c.to_string())
}

/// First available name ending with a candidate's leaf, in candidate order.
pub fn match_suffix(candidates: &[&str], available: &[String]) -> Option<String> {
    candidates.iter().find_map(|c| {
        let tail = leaf(c);
        if tail.is_empty() {
            return None;
        }
        available.iter().find(|a| a.ends_with(tail)).cloned()
    })
}

/// First available name containing any keyword. Candidates are ignored.
pub fn match_keyword(_candidates: &[&str], available: &[String]) -> Option<String> {
    available
        .iter()
        .find(|a| {
            let lower = a.to_lowercase();
            KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .cloned()
}

/// First available name, whatever it is.
pub fn match_first(_candidates: &[&str], available: &[String]) -> Option<String> {
    available.first().cloned()
}

/// Signature shared by every selection strategy.
pub type StrategyFn = fn(&[&str], &[String]) -> Option<String>;

/// Strategies in the order they are tried; the first hit wins.
pub const STRATEGIES: [(Strategy, StrategyFn); 4] = [
    (Strategy::Exact, match_exact),
    (Strategy::Suffix, match_suffix),
    (Strategy::Keyword, match_keyword),
    (Strategy::First, match_first),
];

/// Resolve a variable to read. `None` only when nothing is available.
pub fn select_variable(candidates: &[&str], available: &[String]) -> Option<Selection> {
    STRATEGIES.iter().find_map(|(strategy, matcher)| {
        matcher(candidates, available).map(|name| Selection {
            name,
            strategy: *strategy,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let available = names(&["a/NDVI", "b/Data Fields/NDVI"]);
        let sel = select_variable(&["b/Data Fields/NDVI"], &available).unwrap();
        assert_eq!(sel.name, "b/Data Fields/NDVI");
        assert_eq!(sel.strategy, Strategy::Exact);
    }

    #[test]
    fn test_exact_respects_candidate_order() {
        let available = names(&["second", "first"]);
        let sel = select_variable(&["first", "second"], &available).unwrap();
        assert_eq!(sel.name, "first");
    }

    #[test]
    fn test_suffix_match_on_leaf() {
        let available = names(&[
            "HDFEOS/GRIDS/Other/Data Fields/QA",
            "HDFEOS/GRIDS/Other/Data Fields/CMG_0.05_Deg_Monthly_NDVI",
        ]);
        let sel = select_variable(
            &["HDFEOS/GRIDS/VIIRS_Grid_monthly_VI_CMG/Data_Fields/CMG_0.05_Deg_Monthly_NDVI"],
            &available,
        )
        .unwrap();
        assert_eq!(sel.name, "HDFEOS/GRIDS/Other/Data Fields/CMG_0.05_Deg_Monthly_NDVI");
        assert_eq!(sel.strategy, Strategy::Suffix);
    }

    #[test]
    fn test_suffix_matches_flat_names() {
        // HDF4 scientific datasets are listed by bare name
        let available = names(&["Snow_Spatial_QA", "NDSI_Snow_Cover"]);
        let sel =
            select_variable(&["MOD_Grid_Snow_5km/Data Fields/NDSI_Snow_Cover"], &available)
                .unwrap();
        assert_eq!(sel.name, "NDSI_Snow_Cover");
        assert_eq!(sel.strategy, Strategy::Suffix);
    }

    #[test]
    fn test_keyword_fallback_is_case_insensitive() {
        let available = names(&["Latitude", "Longitude", "CMG 0.05 Deg EVI"]);
        let sel = select_variable(&["missing/leaf"], &available).unwrap();
        assert_eq!(sel.name, "CMG 0.05 Deg EVI");
        assert_eq!(sel.strategy, Strategy::Keyword);
    }

    #[test]
    fn test_first_available_fallback() {
        let available = names(&["lat", "lon"]);
        let sel = select_variable(&[], &available).unwrap();
        assert_eq!(sel.name, "lat");
        assert_eq!(sel.strategy, Strategy::First);
    }

    #[test]
    fn test_nothing_available() {
        assert_eq!(select_variable(&["NDVI"], &[]), None);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let available = names(&["x/snow_a", "y/snow_b", "z/albedo"]);
        let first = select_variable(&["nope"], &available);
        for _ in 0..10 {
            assert_eq!(select_variable(&["nope"], &available), first);
        }
    }

    #[test]
    fn test_strategies_run_in_order() {
        let order: Vec<Strategy> = STRATEGIES.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            order,
            [Strategy::Exact, Strategy::Suffix, Strategy::Keyword, Strategy::First]
        );

        // Every strategy can hit here; the earliest one decides
        let available = names(&["lat", "grid/NDVI", "NDVI"]);
        let sel = select_variable(&["NDVI"], &available).unwrap();
        assert_eq!(sel.strategy, Strategy::Exact);
        assert_eq!(sel.name, "NDVI");

        let sel = select_variable(&["other/NDVI"], &available).unwrap();
        assert_eq!(sel.strategy, Strategy::Suffix);
        assert_eq!(sel.name, "grid/NDVI");
    }

    #[test]
    fn test_each_strategy_alone() {
        let available = names(&["lat", "Surface Albedo"]);
        assert_eq!(match_exact(&["lat"], &available).as_deref(), Some("lat"));
        assert_eq!(match_suffix(&["x/Albedo"], &available).as_deref(), Some("Surface Albedo"));
        assert_eq!(match_keyword(&[], &available).as_deref(), Some("Surface Albedo"));
        assert_eq!(match_first(&[], &available).as_deref(), Some("lat"));
        assert_eq!(match_first(&[], &[]), None);
    }

    #[test]
    fn test_leaf() {
        assert_eq!(leaf("a/b/c"), "c");
        assert_eq!(leaf("flat"), "flat");
        assert_eq!(leaf("trailing/"), "");
    }
}
