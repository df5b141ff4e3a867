use crate::auth::middleware::AuthUser;
use crate::user::model::{
    DonationStats, ProfileResponse, ProfileUpdate, UpdateProfileRequest, UserError, UserProfile,
    DEFAULT_DISPLAY_NAME,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const MAX_NAME_LENGTH: usize = 100;
const MIN_PHONE_DIGITS: usize = 6;
const MAX_PHONE_DIGITS: usize = 15;

/// Check a profile edit and normalize its fields.
pub fn validate_profile_update(request: UpdateProfileRequest) -> Result<ProfileUpdate, UserError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(UserError::Validation("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(UserError::Validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }

    let whatsapp_number = match request.whatsapp_number.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(number) => Some(validate_phone(number)?),
    };

    Ok(ProfileUpdate {
        name: name.to_string(),
        whatsapp_number,
    })
}

// Digits with an optional leading '+'; spaces, dashes and parentheses are kept as typed
fn validate_phone(number: &str) -> Result<String, UserError> {
    let invalid =
        || UserError::Validation("whatsapp_number is not a valid phone number".to_string());

    let body = number.strip_prefix('+').unwrap_or(number);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
    {
        return Err(invalid());
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(invalid());
    }

    Ok(number.to_string())
}

#[derive(Debug, Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the caller's profile, creating it on first access.
    pub async fn get_or_create_profile(
        &self,
        user: &AuthUser,
    ) -> Result<ProfileResponse, UserError> {
        let profile = self.ensure_profile(user).await?;
        let stats = self.donation_stats(user.user_id).await?;
        Ok(ProfileResponse::new(profile, stats))
    }

    pub async fn update_profile(
        &self,
        user: &AuthUser,
        request: UpdateProfileRequest,
    ) -> Result<ProfileResponse, UserError> {
        let update = validate_profile_update(request)?;
        self.ensure_profile(user).await?;

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE marketplace.users
            SET name = $1, whatsapp_number = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&update.name)
        .bind(&update.whatsapp_number)
        .bind(user.user_id)
        .fetch_one(&self.pool)
        .await?;

        info!("Updated profile for user {}", user.user_id);

        let stats = self.donation_stats(user.user_id).await?;
        Ok(ProfileResponse::new(profile, stats))
    }

    // Concurrent first requests both insert; the loser's insert is a no-op
    async fn ensure_profile(&self, user: &AuthUser) -> Result<UserProfile, UserError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO marketplace.users (id, email, name, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(DEFAULT_DISPLAY_NAME)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!("Created profile for user {}", user.user_id);
        }

        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM marketplace.users WHERE id = $1")
                .bind(user.user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(profile)
    }

    async fn donation_stats(&self, user_id: Uuid) -> Result<DonationStats, UserError> {
        let stats = sqlx::query_as::<_, DonationStats>(
            r#"
            SELECT
                COUNT(*) AS total_donations,
                COUNT(*) FILTER (WHERE is_available AND expires_at > NOW()) AS active_listings
            FROM marketplace.food_items
            WHERE donor_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(name: &str, whatsapp_number: Option<&str>) -> UpdateProfileRequest {
        UpdateProfileRequest {
            name: name.to_string(),
            whatsapp_number: whatsapp_number.map(str::to_string),
        }
    }

    #[test]
    fn test_update_trims_name_and_keeps_number() {
        let validated =
            validate_profile_update(update("  Amira ", Some(" +216 20 123 456 "))).unwrap();
        assert_eq!(
            validated,
            ProfileUpdate {
                name: "Amira".to_string(),
                whatsapp_number: Some("+216 20 123 456".to_string()),
            }
        );
    }

    #[test]
    fn test_update_requires_name() {
        let err = validate_profile_update(update("   ", None)).unwrap_err();
        assert!(matches!(err, UserError::Validation(msg) if msg == "name is required"));

        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            validate_profile_update(update(&long, None)),
            Err(UserError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_number_clears_it() {
        let cleared = validate_profile_update(update("Amira", Some("  "))).unwrap();
        assert_eq!(cleared.whatsapp_number, None);

        let missing = validate_profile_update(update("Amira", None)).unwrap();
        assert_eq!(missing.whatsapp_number, None);
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        let malformed = [
            "call me",
            "12345",
            "+216 20 123 456 789 012",
            "++21620123456",
            "2162012345x",
        ];
        for number in malformed {
            assert!(
                matches!(
                    validate_profile_update(update("Amira", Some(number))),
                    Err(UserError::Validation(_))
                ),
                "{} should be rejected",
                number
            );
        }

        assert!(validate_profile_update(update("Amira", Some("(020) 123-456"))).is_ok());
    }

    #[test]
    fn test_response_carries_donation_counts() {
        let now = chrono::Utc::now();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            email: None,
            name: DEFAULT_DISPLAY_NAME.to_string(),
            whatsapp_number: None,
            created_at: now,
            updated_at: now,
        };

        let response = ProfileResponse::new(
            profile,
            DonationStats {
                total_donations: 4,
                active_listings: 1,
            },
        );
        assert_eq!(response.total_donations, 4);
        assert_eq!(response.active_listings, 1);
        assert_eq!(response.profile.name, "Anonymous User");
    }
}
