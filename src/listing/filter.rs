use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::listing::expiry::hours_until;
use crate::listing::model::{FoodCategory, Listing, ListingError};

/// Named expiry window used for discovery. Bounds are inclusive, so adjacent
/// buckets overlap at their edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ExpiryBucket {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "tomorrow")]
    Tomorrow,
    #[serde(rename = "3days")]
    Within3Days,
    #[serde(rename = "week")]
    WithinWeek,
}

impl ExpiryBucket {
    /// Inclusive range of whole hours left that fall in this bucket.
    fn hour_range(&self) -> (i64, i64) {
        match self {
            ExpiryBucket::Today => (0, 24),
            ExpiryBucket::Tomorrow => (24, 48),
            ExpiryBucket::Within3Days => (0, 72),
            ExpiryBucket::WithinWeek => (0, 168),
        }
    }

    pub fn contains(&self, hours_left: i64) -> bool {
        let (low, high) = self.hour_range();
        hours_left >= 0 && (low..=high).contains(&hours_left)
    }
}

impl FromStr for ExpiryBucket {
    type Err = ListingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "today" => Ok(ExpiryBucket::Today),
            "tomorrow" => Ok(ExpiryBucket::Tomorrow),
            "3days" | "within3days" => Ok(ExpiryBucket::Within3Days),
            "week" | "withinweek" => Ok(ExpiryBucket::WithinWeek),
            _ => Err(ListingError::Validation(format!(
                "Unknown expiry filter: {}",
                value
            ))),
        }
    }
}

/// Immutable set of browse constraints. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_text: Option<String>,
    pub category: Option<FoodCategory>,
    pub location: Option<String>,
    pub expiry: Option<ExpiryBucket>,
}

impl FilterCriteria {
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = non_empty(text.into());
        self
    }

    pub fn with_category(mut self, category: FoodCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = non_empty(location.into());
        self
    }

    pub fn with_expiry(mut self, bucket: ExpiryBucket) -> Self {
        self.expiry = Some(bucket);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search_text.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.expiry.is_none()
    }

    /// Whether a single listing passes every active constraint.
    pub fn matches(&self, listing: &Listing, now: DateTime<Utc>) -> bool {
        if !listing.is_available {
            return false;
        }

        if let Some(query) = self.search_text.as_deref().filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            let found = [&listing.title, &listing.description, &listing.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&query));
            if !found {
                return false;
            }
        }

        if let Some(category) = self.category {
            if listing.category != category {
                return false;
            }
        }

        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            if !listing
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }

        if let Some(bucket) = self.expiry {
            if !bucket.contains(hours_until(listing.expires_at, now)) {
                return false;
            }
        }

        true
    }
}

/// Browse query string as received over HTTP. Empty values mean "unset".
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrowseParams {
    /// Matched against title, description and location
    #[schema(example = "bread")]
    pub search: Option<String>,
    #[schema(example = "cooked-meals")]
    pub category: Option<String>,
    #[schema(example = "Tunis")]
    pub location: Option<String>,
    /// One of today, tomorrow, 3days, week
    #[schema(example = "today")]
    pub expiry: Option<String>,
}

impl TryFrom<BrowseParams> for FilterCriteria {
    type Error = ListingError;

    fn try_from(params: BrowseParams) -> Result<Self, Self::Error> {
        let category = params
            .category
            .and_then(non_empty)
            .map(|c| c.parse::<FoodCategory>())
            .transpose()?;
        let expiry = params
            .expiry
            .and_then(non_empty)
            .map(|e| e.parse::<ExpiryBucket>())
            .transpose()?;

        Ok(FilterCriteria {
            search_text: params.search.and_then(non_empty),
            category,
            location: params.location.and_then(non_empty),
            expiry,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Stable single-pass filter: keeps the input order and never fails.
pub fn filter_listings<'a, I>(
    listings: I,
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Vec<&'a Listing>
where
    I: IntoIterator<Item = &'a Listing>,
{
    listings
        .into_iter()
        .filter(|listing| criteria.matches(listing, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::model::ContactMethod;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn listing(title: &str, category: FoodCategory, location: &str, hours_left: i64) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{} to share", title),
            category,
            quantity: "1 box".to_string(),
            location: location.to_string(),
            expires_at: now() + Duration::hours(hours_left),
            pickup_instructions: None,
            image_url: None,
            donor_id: Uuid::new_v4(),
            donor_name: "Donor".to_string(),
            donor_contact: "donor@example.com".to_string(),
            contact_method: ContactMethod::Email,
            is_available: true,
            created_at: now() - Duration::hours(1),
            updated_at: now() - Duration::hours(1),
        }
    }

    fn catalog() -> Vec<Listing> {
        let mut hidden = listing("Hidden Bread", FoodCategory::Bread, "Tunis", 10);
        hidden.is_available = false;

        vec![
            listing("Fresh Bread", FoodCategory::Bread, "Tunis Centre", 5),
            listing("Couscous", FoodCategory::CookedMeals, "Sfax", 30),
            listing("Oranges", FoodCategory::Fruits, "Sousse", 100),
            hidden,
            listing("Old Yogurt", FoodCategory::Dairy, "Tunis", -2),
        ]
    }

    fn titles(items: &[&Listing]) -> Vec<String> {
        items.iter().map(|l| l.title.clone()).collect()
    }

    #[test]
    fn test_text_search_matches_title() {
        let items = vec![
            listing("Fresh Bread", FoodCategory::Bread, "Tunis", 5),
            listing("Couscous", FoodCategory::CookedMeals, "Tunis", 5),
        ];
        let criteria = FilterCriteria::default().with_search_text("bread");

        let result = filter_listings(&items, &criteria, now());
        assert_eq!(titles(&result), vec!["Fresh Bread"]);
    }

    #[test]
    fn test_text_search_any_field_case_insensitive() {
        let items = catalog();

        let by_location = FilterCriteria::default().with_search_text("SFAX");
        assert_eq!(titles(&filter_listings(&items, &by_location, now())), vec!["Couscous"]);

        let by_description = FilterCriteria::default().with_search_text("oranges to SHARE");
        assert_eq!(titles(&filter_listings(&items, &by_description, now())), vec!["Oranges"]);
    }

    #[test]
    fn test_unavailable_always_excluded() {
        let items = catalog();

        let all = filter_listings(&items, &FilterCriteria::default(), now());
        assert!(all.iter().all(|l| l.is_available));
        assert!(!titles(&all).contains(&"Hidden Bread".to_string()));

        let bread = FilterCriteria::default().with_category(FoodCategory::Bread);
        assert_eq!(titles(&filter_listings(&items, &bread, now())), vec!["Fresh Bread"]);
    }

    #[test]
    fn test_empty_criteria_keeps_expired_available_items_in_order() {
        let items = catalog();
        let result = filter_listings(&items, &FilterCriteria::default(), now());
        assert_eq!(
            titles(&result),
            vec!["Fresh Bread", "Couscous", "Oranges", "Old Yogurt"]
        );
    }

    #[test]
    fn test_empty_source_returns_empty() {
        let items: Vec<Listing> = Vec::new();
        let criteria = FilterCriteria::default().with_search_text("anything");
        assert!(filter_listings(&items, &criteria, now()).is_empty());
    }

    #[test]
    fn test_location_substring_only_checks_location() {
        let items = catalog();
        let criteria = FilterCriteria::default().with_location("tunis");
        assert_eq!(
            titles(&filter_listings(&items, &criteria, now())),
            vec!["Fresh Bread", "Old Yogurt"]
        );

        // "Couscous" appears in a title, not a location.
        let criteria = FilterCriteria::default().with_location("couscous");
        assert!(filter_listings(&items, &criteria, now()).is_empty());
    }

    #[test]
    fn test_expiry_buckets() {
        let items = catalog();

        let today = FilterCriteria::default().with_expiry(ExpiryBucket::Today);
        assert_eq!(titles(&filter_listings(&items, &today, now())), vec!["Fresh Bread"]);

        let tomorrow = FilterCriteria::default().with_expiry(ExpiryBucket::Tomorrow);
        assert_eq!(titles(&filter_listings(&items, &tomorrow, now())), vec!["Couscous"]);

        let three_days = FilterCriteria::default().with_expiry(ExpiryBucket::Within3Days);
        assert_eq!(
            titles(&filter_listings(&items, &three_days, now())),
            vec!["Fresh Bread", "Couscous"]
        );

        let week = FilterCriteria::default().with_expiry(ExpiryBucket::WithinWeek);
        assert_eq!(
            titles(&filter_listings(&items, &week, now())),
            vec!["Fresh Bread", "Couscous", "Oranges"]
        );
    }

    #[test]
    fn test_bucket_boundary_at_24_hours_overlaps() {
        let items = vec![listing("Soup", FoodCategory::CookedMeals, "Tunis", 24)];

        let today = FilterCriteria::default().with_expiry(ExpiryBucket::Today);
        let tomorrow = FilterCriteria::default().with_expiry(ExpiryBucket::Tomorrow);

        assert_eq!(filter_listings(&items, &today, now()).len(), 1);
        assert_eq!(filter_listings(&items, &tomorrow, now()).len(), 1);
    }

    #[test]
    fn test_recently_expired_never_in_bucket() {
        let mut item = listing("Milk", FoodCategory::Dairy, "Tunis", 0);
        item.expires_at = now() - Duration::minutes(10);
        let items = vec![item];

        for bucket in [
            ExpiryBucket::Today,
            ExpiryBucket::Tomorrow,
            ExpiryBucket::Within3Days,
            ExpiryBucket::WithinWeek,
        ] {
            let criteria = FilterCriteria::default().with_expiry(bucket);
            assert!(filter_listings(&items, &criteria, now()).is_empty());
        }
    }

    #[test]
    fn test_and_composition_equals_sequential_filtering() {
        let items = catalog();
        let first = FilterCriteria::default().with_location("tunis");
        let second = FilterCriteria::default().with_expiry(ExpiryBucket::Today);
        let combined = FilterCriteria::default()
            .with_location("tunis")
            .with_expiry(ExpiryBucket::Today);

        let sequential = filter_listings(
            filter_listings(&items, &first, now()),
            &second,
            now(),
        );
        let reversed = filter_listings(
            filter_listings(&items, &second, now()),
            &first,
            now(),
        );
        let together = filter_listings(&items, &combined, now());

        assert_eq!(titles(&together), vec!["Fresh Bread"]);
        assert_eq!(titles(&sequential), titles(&together));
        assert_eq!(titles(&reversed), titles(&together));
    }

    #[test]
    fn test_refilter_is_idempotent() {
        let items = catalog();
        let criteria = FilterCriteria::default().with_search_text("o");

        let once = filter_listings(&items, &criteria, now());
        let twice = filter_listings(once.iter().copied(), &criteria, now());
        assert_eq!(titles(&once), titles(&twice));
    }

    #[test]
    fn test_browse_params_conversion() {
        let params = BrowseParams {
            search: Some("".to_string()),
            category: Some("cooked-meals".to_string()),
            location: Some("  ".to_string()),
            expiry: Some("3days".to_string()),
        };
        let criteria = FilterCriteria::try_from(params).unwrap();

        assert_eq!(criteria.search_text, None);
        assert_eq!(criteria.category, Some(FoodCategory::CookedMeals));
        assert_eq!(criteria.location, None);
        assert_eq!(criteria.expiry, Some(ExpiryBucket::Within3Days));

        assert!(FilterCriteria::try_from(BrowseParams::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_browse_params_reject_unknown_values() {
        let bad_category = BrowseParams {
            category: Some("candy".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            FilterCriteria::try_from(bad_category),
            Err(ListingError::Validation(_))
        ));

        let bad_expiry = BrowseParams {
            expiry: Some("fortnight".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            FilterCriteria::try_from(bad_expiry),
            Err(ListingError::Validation(_))
        ));
    }
}
