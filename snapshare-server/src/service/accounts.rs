use snapshare_types::{AuthPayload, User};

use crate::auth::{PasswordHasher, TokenService, Viewer};
use crate::db::repositories::{NewUser, ProfileUpdate, UserRepository};
use crate::db::{is_unique_violation, DbPool};

use super::error::{ServiceError, ServiceResult};
use super::validation;

const EMAIL_TAKEN: &str = "Email already exists";
const USERNAME_TAKEN: &str = "Username already taken";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Profile fields submitted by `updateProfile`.
///
/// `bio` and `avatar_url` keep their stored value when omitted and are
/// cleared when sent blank.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Signup, login and profile operations
#[derive(Clone)]
pub struct AccountService {
    pool: DbPool,
    tokens: TokenService,
    passwords: PasswordHasher,
}

impl AccountService {
    pub fn new(pool: DbPool, tokens: TokenService, passwords: PasswordHasher) -> Self {
        Self {
            pool,
            tokens,
            passwords,
        }
    }

    fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    fn auth_payload(&self, user: User) -> ServiceResult<AuthPayload> {
        let token = self.tokens.issue(user.id, &user.username)?;
        Ok(AuthPayload { token, user })
    }

    /// Register a new account and log it in
    pub fn signup(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<AuthPayload> {
        let name = validation::required("Name", name)?;
        let username = validation::username(username)?;
        let email = validation::email(email)?;
        let password = validation::password(password)?;

        let users = self.users();
        if users.email_taken(email, None)? {
            return Err(ServiceError::bad_input(EMAIL_TAKEN));
        }
        if users.username_taken(username, None)? {
            return Err(ServiceError::bad_input(USERNAME_TAKEN));
        }

        let password_hash = self.passwords.hash(password)?;
        let user = users
            .create(&NewUser {
                name,
                username,
                email,
                password_hash: &password_hash,
            })
            .map_err(|e| self.conflict_or_internal(e, username, email, None))?;

        tracing::info!("Created account {} ({})", user.username, user.id);
        self.auth_payload(user)
    }

    /// Log in by username or email
    ///
    /// Unknown identifiers and wrong passwords produce the same error.
    pub fn login(&self, login_identifier: &str, password: &str) -> ServiceResult<AuthPayload> {
        let identifier = login_identifier.trim();

        let Some((user, hash)) = self.users().get_credentials(identifier)? else {
            self.passwords.verify_dummy(password);
            tracing::debug!("Login failed: unknown identifier");
            return Err(ServiceError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        };

        if !self.passwords.verify(password, &hash) {
            tracing::debug!("Login failed: wrong password for user {}", user.id);
            return Err(ServiceError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!("User {} logged in", user.id);
        self.auth_payload(user)
    }

    /// The caller's own account; `None` if the row has since disappeared
    pub fn me(&self, viewer: &Viewer) -> ServiceResult<Option<User>> {
        let user_id = viewer.require()?;
        Ok(self.users().get_by_id(user_id)?)
    }

    /// Look up a profile by username, or the caller's own when omitted
    pub fn user_profile(&self, viewer: &Viewer, username: Option<&str>) -> ServiceResult<Option<User>> {
        match validation::optional(username) {
            Some(username) => Ok(self.users().get_by_username(username)?),
            None => match viewer.user_id() {
                Some(user_id) => Ok(self.users().get_by_id(user_id)?),
                None => Ok(None),
            },
        }
    }

    pub fn get_user(&self, user_id: i64) -> ServiceResult<Option<User>> {
        Ok(self.users().get_by_id(user_id)?)
    }

    pub fn all_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users().list_all()?)
    }

    /// Replace the caller's profile fields
    pub fn update_profile(&self, viewer: &Viewer, changes: &ProfileChanges) -> ServiceResult<User> {
        let user_id = viewer.require()?;
        let name = validation::required("Name", &changes.name)?;
        let username = validation::username(&changes.username)?;
        let email = validation::email(&changes.email)?;

        let users = self.users();
        let current = users
            .get_by_id(user_id)?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        if users.email_taken(email, Some(user_id))? {
            return Err(ServiceError::bad_input(EMAIL_TAKEN));
        }
        if users.username_taken(username, Some(user_id))? {
            return Err(ServiceError::bad_input(USERNAME_TAKEN));
        }

        let bio = match changes.bio.as_deref() {
            Some(bio) => validation::optional(Some(bio)),
            None => current.bio.as_deref(),
        };
        let avatar_url = match changes.avatar_url.as_deref() {
            Some(url) => validation::optional(Some(url)),
            None => current.avatar_url.as_deref(),
        };

        let updated = users
            .update_profile(
                user_id,
                &ProfileUpdate {
                    name,
                    username,
                    email,
                    bio,
                    avatar_url,
                },
            )
            .map_err(|e| self.conflict_or_internal(e, username, email, Some(user_id)))?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        tracing::info!("Updated profile for user {}", user_id);
        Ok(updated)
    }

    // A concurrent writer can claim the username or email between the check
    // and the write; report that the same way as the check would have.
    fn conflict_or_internal(
        &self,
        err: anyhow::Error,
        username: &str,
        email: &str,
        except_user_id: Option<i64>,
    ) -> ServiceError {
        if !is_unique_violation(&err) {
            return ServiceError::Internal(err);
        }
        match self.users().email_taken(email, except_user_id) {
            Ok(true) => ServiceError::bad_input(EMAIL_TAKEN),
            Ok(false) => {
                tracing::debug!("Unique conflict on username {}", username);
                ServiceError::bad_input(USERNAME_TAKEN)
            }
            Err(e) => ServiceError::Internal(e.context("Failed to classify unique conflict")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use snapshare_types::{ErrorCode, TokenClaims};

    fn setup() -> AccountService {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        AccountService::new(
            db.pool,
            TokenService::new("test-secret", 24),
            PasswordHasher::new(4),
        )
    }

    fn user_count(service: &AccountService) -> i64 {
        service.users().count().unwrap()
    }

    #[test]
    fn test_signup_returns_token_for_new_user() {
        let service = setup();
        let payload = service
            .signup("Ada Lovelace", "ada", "ada@example.com", "analytical")
            .unwrap();

        assert_eq!(payload.user.username, "ada");
        let claims = TokenClaims::decode_unverified(&payload.token).unwrap();
        assert_eq!(claims.user_id, payload.user.id);
        assert_eq!(claims.username, "ada");
        assert_eq!(service.tokens.verify(&payload.token).unwrap(), payload.user.id);
    }

    #[test]
    fn test_signup_duplicate_email_creates_no_row() {
        let service = setup();
        service.signup("Ada", "ada", "ada@example.com", "secret1").unwrap();

        let err = service
            .signup("Imposter", "other", "ada@example.com", "secret1")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadUserInput);
        assert_eq!(err.to_string(), "Email already exists");
        assert_eq!(user_count(&service), 1);
    }

    #[test]
    fn test_signup_duplicate_username_creates_no_row() {
        let service = setup();
        service.signup("Ada", "ada", "ada@example.com", "secret1").unwrap();

        let err = service
            .signup("Imposter", "ada", "other@example.com", "secret1")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadUserInput);
        assert_eq!(err.to_string(), "Username already taken");
        assert_eq!(user_count(&service), 1);
    }

    #[test]
    fn test_signup_validation() {
        let service = setup();
        let cases = [
            ("", "ada", "ada@example.com", "secret1"),
            ("Ada", "a", "ada@example.com", "secret1"),
            ("Ada", "ada", "not-an-email", "secret1"),
            ("Ada", "ada", "ada@example.com", "123"),
        ];
        for (name, username, email, password) in cases {
            let err = service.signup(name, username, email, password).unwrap_err();
            assert_eq!(err.code(), ErrorCode::BadUserInput);
        }
        assert_eq!(user_count(&service), 0);
    }

    #[test]
    fn test_unique_conflict_maps_to_bad_input() {
        let service = setup();
        service.signup("Ada", "ada", "ada@example.com", "secret1").unwrap();

        let err = service
            .users()
            .create(&NewUser {
                name: "Race",
                username: "ada",
                email: "race@example.com",
                password_hash: "x",
            })
            .unwrap_err();
        let mapped = service.conflict_or_internal(err, "ada", "race@example.com", None);
        assert_eq!(mapped.to_string(), "Username already taken");

        let err = service
            .users()
            .create(&NewUser {
                name: "Race",
                username: "racer",
                email: "ada@example.com",
                password_hash: "x",
            })
            .unwrap_err();
        let mapped = service.conflict_or_internal(err, "racer", "ada@example.com", None);
        assert_eq!(mapped.to_string(), "Email already exists");
    }

    #[test]
    fn test_login_by_username_or_email() {
        let service = setup();
        let created = service.signup("Ada", "ada", "ada@example.com", "secret1").unwrap();

        assert_eq!(service.login("ada", "secret1").unwrap().user.id, created.user.id);
        assert_eq!(
            service.login(" ada@example.com ", "secret1").unwrap().user.id,
            created.user.id
        );
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let service = setup();
        service.signup("Ada", "ada", "ada@example.com", "secret1").unwrap();

        let wrong_password = service.login("ada", "wrong-password").unwrap_err();
        let unknown_user = service.login("nobody", "secret1").unwrap_err();

        assert_eq!(wrong_password.code(), ErrorCode::Unauthenticated);
        assert_eq!(unknown_user.code(), ErrorCode::Unauthenticated);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_me_and_user_profile() {
        let service = setup();
        let ada = service.signup("Ada", "ada", "ada@example.com", "secret1").unwrap().user;
        let viewer = Viewer::user(ada.id);

        assert_eq!(service.me(&viewer).unwrap().map(|u| u.id), Some(ada.id));
        assert!(matches!(
            service.me(&Viewer::anonymous()),
            Err(ServiceError::Unauthenticated(_))
        ));
        assert!(service.me(&Viewer::user(ada.id + 10)).unwrap().is_none());

        assert_eq!(
            service.user_profile(&Viewer::anonymous(), Some("ada")).unwrap().map(|u| u.id),
            Some(ada.id)
        );
        assert_eq!(
            service.user_profile(&viewer, None).unwrap().map(|u| u.id),
            Some(ada.id)
        );
        assert!(service.user_profile(&Viewer::anonymous(), None).unwrap().is_none());
        assert!(service.user_profile(&viewer, Some("ghost")).unwrap().is_none());
    }

    #[test]
    fn test_update_profile() {
        let service = setup();
        let ada = service.signup("Ada", "ada", "ada@example.com", "secret1").unwrap().user;
        service.signup("Grace", "grace", "grace@example.com", "secret1").unwrap();
        let viewer = Viewer::user(ada.id);

        let updated = service
            .update_profile(
                &viewer,
                &ProfileChanges {
                    name: "Ada Lovelace".into(),
                    username: "countess".into(),
                    email: "ada@example.com".into(),
                    bio: Some("Poetical science".into()),
                    avatar_url: Some("https://img.example/ada.png".into()),
                },
            )
            .unwrap();
        assert_eq!(updated.username, "countess");
        assert_eq!(updated.bio.as_deref(), Some("Poetical science"));

        // Omitted bio keeps its value, blank avatar clears it
        let updated = service
            .update_profile(
                &viewer,
                &ProfileChanges {
                    name: "Ada Lovelace".into(),
                    username: "countess".into(),
                    email: "ada@example.com".into(),
                    bio: None,
                    avatar_url: Some("  ".into()),
                },
            )
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Poetical science"));
        assert_eq!(updated.avatar_url, None);

        let taken = service
            .update_profile(
                &viewer,
                &ProfileChanges {
                    name: "Ada".into(),
                    username: "grace".into(),
                    email: "ada@example.com".into(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(taken.to_string(), "Username already taken");

        let anon = service
            .update_profile(&Viewer::anonymous(), &ProfileChanges::default())
            .unwrap_err();
        assert_eq!(anon.code(), ErrorCode::Unauthenticated);
    }

    #[test]
    fn test_all_users_sorted() {
        let service = setup();
        service.signup("Zed", "zed", "zed@example.com", "secret1").unwrap();
        service.signup("Amy", "amy", "amy@example.com", "secret1").unwrap();

        let names: Vec<String> = service
            .all_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }
}
