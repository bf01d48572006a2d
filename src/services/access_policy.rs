use thiserror::Error;

use crate::db::models::{Question, User};
use crate::db::types::UserRole;

/// Who is asking. Anonymous callers only ever reach read paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Actor {
    Anonymous,
    Member { id: String, role: UserRole },
}

impl Actor {
    pub(crate) fn is_admin(&self) -> bool {
        matches!(self, Self::Member { role: UserRole::Admin, .. })
    }

    fn id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Member { id, .. } => Some(id),
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::Member { id: user.id.clone(), role: user.role }
    }
}

impl From<Option<&User>> for Actor {
    fn from(user: Option<&User>) -> Self {
        user.map(Actor::from).unwrap_or(Actor::Anonymous)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuestionAction {
    Read,
    Update,
    Delete,
    Approve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CourseAction {
    Read,
    Create,
    Update,
    Delete,
}

/// The two question attributes authorization depends on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QuestionAccess<'a> {
    pub(crate) uploaded_by: &'a str,
    pub(crate) approved: bool,
}

impl<'a> From<&'a Question> for QuestionAccess<'a> {
    fn from(question: &'a Question) -> Self {
        Self { uploaded_by: &question.uploaded_by, approved: question.approved }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum Denial {
    #[error("Authorization token required")]
    Unauthenticated,
    #[error("Access denied")]
    NotOwner,
    #[error("Cannot update approved question")]
    ApprovedUpdate,
    #[error("Cannot delete approved question")]
    ApprovedDelete,
    #[error("Access denied. Admin privileges required.")]
    AdminOnly,
}

pub(crate) fn authorize_question(
    actor: &Actor,
    question: QuestionAccess<'_>,
    action: QuestionAction,
) -> Result<(), Denial> {
    if action == QuestionAction::Read {
        let owns = actor.id() == Some(question.uploaded_by);
        return if question.approved || actor.is_admin() || owns {
            Ok(())
        } else {
            Err(Denial::NotOwner)
        };
    }

    let Some(actor_id) = actor.id() else {
        return Err(Denial::Unauthenticated);
    };

    if actor.is_admin() {
        return Ok(());
    }

    match action {
        QuestionAction::Approve => Err(Denial::AdminOnly),
        QuestionAction::Update | QuestionAction::Delete if actor_id != question.uploaded_by => {
            Err(Denial::NotOwner)
        }
        QuestionAction::Update if question.approved => Err(Denial::ApprovedUpdate),
        QuestionAction::Delete if question.approved => Err(Denial::ApprovedDelete),
        _ => Ok(()),
    }
}

pub(crate) fn authorize_course(actor: &Actor, action: CourseAction) -> Result<(), Denial> {
    match action {
        CourseAction::Read => Ok(()),
        _ => require_admin(actor),
    }
}

pub(crate) fn require_admin(actor: &Actor) -> Result<(), Denial> {
    match actor {
        Actor::Anonymous => Err(Denial::Unauthenticated),
        actor if actor.is_admin() => Ok(()),
        _ => Err(Denial::AdminOnly),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> Actor {
        Actor::Member { id: id.to_string(), role: UserRole::User }
    }

    fn admin() -> Actor {
        Actor::Member { id: "admin".to_string(), role: UserRole::Admin }
    }

    fn question(owner: &str, approved: bool) -> QuestionAccess<'_> {
        QuestionAccess { uploaded_by: owner, approved }
    }

    #[test]
    fn read_visibility() {
        let pending = question("owner", false);
        let approved = question("owner", true);

        assert_eq!(authorize_question(&Actor::Anonymous, approved, QuestionAction::Read), Ok(()));
        assert_eq!(
            authorize_question(&Actor::Anonymous, pending, QuestionAction::Read),
            Err(Denial::NotOwner)
        );
        assert_eq!(authorize_question(&member("owner"), pending, QuestionAction::Read), Ok(()));
        assert_eq!(
            authorize_question(&member("other"), pending, QuestionAction::Read),
            Err(Denial::NotOwner)
        );
        assert_eq!(authorize_question(&admin(), pending, QuestionAction::Read), Ok(()));
    }

    #[test]
    fn owner_loses_write_access_once_approved() {
        let owner = member("owner");

        assert_eq!(
            authorize_question(&owner, question("owner", false), QuestionAction::Update),
            Ok(())
        );
        assert_eq!(
            authorize_question(&owner, question("owner", true), QuestionAction::Update),
            Err(Denial::ApprovedUpdate)
        );
        assert_eq!(
            authorize_question(&owner, question("owner", true), QuestionAction::Delete),
            Err(Denial::ApprovedDelete)
        );
        assert_eq!(
            authorize_question(&admin(), question("owner", true), QuestionAction::Delete),
            Ok(())
        );
    }

    #[test]
    fn ownership_checked_before_approval() {
        assert_eq!(
            authorize_question(&member("other"), question("owner", true), QuestionAction::Update),
            Err(Denial::NotOwner)
        );
    }

    #[test]
    fn anonymous_mutations_are_unauthenticated() {
        for action in [QuestionAction::Update, QuestionAction::Delete, QuestionAction::Approve] {
            assert_eq!(
                authorize_question(&Actor::Anonymous, question("owner", false), action),
                Err(Denial::Unauthenticated)
            );
        }
    }

    #[test]
    fn approve_and_course_writes_are_admin_only() {
        assert_eq!(
            authorize_question(&member("owner"), question("owner", false), QuestionAction::Approve),
            Err(Denial::AdminOnly)
        );
        assert_eq!(
            authorize_question(&admin(), question("owner", true), QuestionAction::Approve),
            Ok(())
        );

        assert_eq!(authorize_course(&Actor::Anonymous, CourseAction::Read), Ok(()));
        assert_eq!(authorize_course(&member("u"), CourseAction::Create), Err(Denial::AdminOnly));
        assert_eq!(authorize_course(&admin(), CourseAction::Delete), Ok(()));
        assert_eq!(require_admin(&Actor::Anonymous), Err(Denial::Unauthenticated));
    }
}
