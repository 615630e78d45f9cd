use crate::config::schema::DatabaseConfig;
use crate::error::WellcatError;
use crate::model::{Category, LookupKey, WellType};
use crate::normalize::normalize_lims;
use crate::table::index_rows;
use crate::table::schema::{CategoryRow, CategoryTable};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

/// Result of resolving one lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The canonical key that was looked up.
    pub key: LookupKey,
    pub category: Category,
    /// False when `category` is the substituted default.
    pub matched: bool,
    /// True when the match only succeeded after LIMS normalization.
    pub via_normalized_lims: bool,
}

impl Resolution {
    pub fn as_pair(&self) -> (Category, bool) {
        (self.category, self.matched)
    }
}

/// Exact-match category table for one database.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct CategoryLookup {
    config: DatabaseConfig,
    entries: HashMap<LookupKey, Category>,
    explicit_count: usize,
    control_attribution_codes: BTreeSet<String>,
}

impl CategoryLookup {
    pub fn from_table(
        table: &CategoryTable,
        config: &DatabaseConfig,
    ) -> Result<CategoryLookup, WellcatError> {
        Self::load(&table.rows, config)
    }

    /// Build the lookup from table rows.
    ///
    /// Fails on two rows with the same canonical key but different categories.
    /// Rows whose LIMS status normalizes to a different value also register the
    /// normalized key, unless an explicit row already owns it; normalized keys
    /// that disagree with each other are withdrawn.
    pub fn load(
        rows: &[CategoryRow],
        config: &DatabaseConfig,
    ) -> Result<CategoryLookup, WellcatError> {
        let explicit = index_rows(rows)?;

        let mut derived: HashMap<LookupKey, Option<Category>> = HashMap::new();
        for row in rows {
            let normalized = normalize_lims(&row.key.lims_status, config);
            if normalized == row.key.lims_status {
                continue;
            }
            let key = row.key.with_lims(&normalized);
            if explicit.contains_key(&key) {
                continue;
            }
            match derived.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(Some(row.category));
                }
                Entry::Occupied(mut slot) => {
                    if let Some(existing) = *slot.get() {
                        if existing != row.category {
                            tracing::warn!(
                                key = %slot.key(),
                                first = %existing,
                                second = %row.category,
                                "normalized LIMS variants disagree; key withdrawn"
                            );
                            *slot.get_mut() = None;
                        }
                    }
                }
            }
        }

        let control_attribution_codes: BTreeSet<String> = rows
            .iter()
            .filter(|r| {
                r.key.well_type == WellType::Sample
                    && r.category == Category::ControlAffectedSample
                    && !r.key.error_code.is_empty()
            })
            .map(|r| r.key.error_code.clone())
            .collect();

        let explicit_count = explicit.len();
        let mut entries: HashMap<LookupKey, Category> = explicit
            .into_iter()
            .map(|(key, (category, _))| (key, category))
            .collect();
        let mut derived_count = 0;
        for (key, category) in derived {
            if let Some(category) = category {
                entries.insert(key, category);
                derived_count += 1;
            }
        }

        tracing::info!(
            database = %config.name,
            rows = rows.len(),
            entries = entries.len(),
            derived = derived_count,
            control_attribution_codes = control_attribution_codes.len(),
            "loaded category table"
        );

        Ok(CategoryLookup {
            config: config.clone(),
            entries,
            explicit_count,
            control_attribution_codes,
        })
    }

    /// Resolve raw field values to a category.
    ///
    /// Never fails: unmatched keys get `SOP_UNRESOLVED` when an error code is
    /// present and `IGNORE_WELL` otherwise, with `matched = false`.
    pub fn resolve(
        &self,
        well_type: WellType,
        error_code: Option<&str>,
        resolution_codes: Option<&str>,
        lims_status: Option<&str>,
    ) -> Resolution {
        let key = LookupKey::new(well_type, error_code, resolution_codes, lims_status);
        self.resolve_key(&key)
    }

    /// Resolve an already canonical key.
    pub fn resolve_key(&self, key: &LookupKey) -> Resolution {
        if let Some(&category) = self.entries.get(key) {
            return Resolution {
                key: key.clone(),
                category,
                matched: true,
                via_normalized_lims: false,
            };
        }

        let normalized = normalize_lims(&key.lims_status, &self.config);
        if normalized != key.lims_status {
            if let Some(&category) = self.entries.get(&key.with_lims(&normalized)) {
                return Resolution {
                    key: key.clone(),
                    category,
                    matched: true,
                    via_normalized_lims: true,
                };
            }
        }

        Resolution {
            key: key.clone(),
            category: default_category(key),
            matched: false,
            via_normalized_lims: false,
        }
    }

    /// Whether a sample error code attributes the well to a failed control.
    pub fn is_control_attributed(&self, error_code: &str) -> bool {
        let code = error_code.trim();
        !code.is_empty() && self.control_attribution_codes.contains(code)
    }

    pub fn control_attribution_codes(&self) -> &BTreeSet<String> {
        &self.control_attribution_codes
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Number of keys, including normalized-LIMS variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys that came straight from table rows.
    pub fn explicit_len(&self) -> usize {
        self.explicit_count
    }
}

/// Category substituted for an unmatched key.
pub fn default_category(key: &LookupKey) -> Category {
    if key.error_code.is_empty() {
        Category::IgnoreWell
    } else {
        Category::SopUnresolved
    }
}
