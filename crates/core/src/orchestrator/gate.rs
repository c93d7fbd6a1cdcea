//! Gating predicates.
//!
//! Pure functions of the dependency graph, the status store and whether the
//! current credentials are usable. Checks run in a fixed priority order and
//! the first failing check decides the reason.

use std::collections::BTreeSet;

use crate::feature::{
    DependencyGraph, DeploymentAction, DeploymentActionBlockedReason as Reason, FeatureStatus,
    FeatureStatusStore, FeatureType,
};

use super::types::DeploymentActionCheck;

/// Read-only view the gates evaluate against.
pub(crate) struct Gate<'a> {
    pub graph: &'a DependencyGraph,
    pub store: &'a FeatureStatusStore,
    pub credentials_valid: bool,
}

impl Gate<'_> {
    /// Evaluate `action` against `target`.
    pub fn check(&self, action: DeploymentAction, target: FeatureType) -> DeploymentActionCheck {
        self.check_with_satisfied(action, target, &BTreeSet::new())
    }

    /// Like [`Gate::check`], but upstream features in `satisfied` pass the
    /// dependency check regardless of their status. Used when those features
    /// are deployed earlier in the same plan.
    pub fn check_with_satisfied(
        &self,
        action: DeploymentAction,
        target: FeatureType,
        satisfied: &BTreeSet<FeatureType>,
    ) -> DeploymentActionCheck {
        if !self.credentials_valid {
            return DeploymentActionCheck::blocked(target, Reason::CredentialsInvalid, Vec::new());
        }

        if let Some(check) = self.check_in_progress(action, target) {
            return check;
        }

        if let Some(check) = self.check_own_status(action, target) {
            return check;
        }

        match action {
            DeploymentAction::Create | DeploymentAction::Redeploy => {
                self.check_upstream(target, satisfied)
            }
            DeploymentAction::Delete => self.check_downstream(target),
        }
    }

    /// Plan gate for create/redeploy: `Main` is deployed first, then `target`.
    ///
    /// When `Main` is not the target it must be creatable or redeployable,
    /// and the target then sees it as satisfied. A blocked `Main` is reported
    /// against `target`, with `Main` among the blocking features.
    pub fn check_deploy_plan(
        &self,
        action: DeploymentAction,
        target: FeatureType,
    ) -> DeploymentActionCheck {
        if target == FeatureType::Main {
            return self.check(action, target);
        }

        let main = self.check_main_stack(action);
        if !main.can_execute {
            let reason = match main.reason {
                Reason::CredentialsInvalid | Reason::OngoingDeployments => main.reason,
                _ => Reason::DependenciesStatusIsInvalid,
            };
            let blocking = match reason {
                Reason::CredentialsInvalid => Vec::new(),
                _ => self.graph.sorted(
                    main.blocking_features
                        .into_iter()
                        .chain(std::iter::once(FeatureType::Main)),
                ),
            };
            return DeploymentActionCheck::blocked(target, reason, blocking);
        }

        self.check_with_satisfied(action, target, &BTreeSet::from([FeatureType::Main]))
    }

    /// `Main` passes if either the create or the redeploy rule accepts it.
    fn check_main_stack(&self, action: DeploymentAction) -> DeploymentActionCheck {
        let preferred = self.check(action, FeatureType::Main);
        if preferred.can_execute {
            return preferred;
        }
        let other = match action {
            DeploymentAction::Create => DeploymentAction::Redeploy,
            _ => DeploymentAction::Create,
        };
        let fallback = self.check(other, FeatureType::Main);
        if fallback.can_execute {
            fallback
        } else {
            preferred
        }
    }

    fn check_in_progress(
        &self,
        action: DeploymentAction,
        target: FeatureType,
    ) -> Option<DeploymentActionCheck> {
        let related = match action {
            DeploymentAction::Create | DeploymentAction::Redeploy => self.graph.upstream_of(target),
            DeploymentAction::Delete => self.graph.downstream_of(target),
        };

        let blocking = self.graph.sorted(
            std::iter::once(target)
                .chain(related)
                .filter(|f| self.store.is_in_progress(*f)),
        );

        if blocking.is_empty() {
            None
        } else {
            Some(DeploymentActionCheck::blocked(
                target,
                Reason::OngoingDeployments,
                blocking,
            ))
        }
    }

    fn check_own_status(
        &self,
        action: DeploymentAction,
        target: FeatureType,
    ) -> Option<DeploymentActionCheck> {
        let status = self.store.status(target);
        let blocked = |reason| Some(DeploymentActionCheck::blocked(target, reason, Vec::new()));

        if status.is_in_flight() {
            // Someone else is working on the stack.
            return Some(DeploymentActionCheck::blocked(
                target,
                Reason::OngoingDeployments,
                vec![target],
            ));
        }

        match (action, status) {
            (_, FeatureStatus::Unknown) => blocked(Reason::FeatureStatusIsUnknown),
            (DeploymentAction::Create, FeatureStatus::Deployed | FeatureStatus::RollbackComplete) => {
                blocked(Reason::FeatureMustBeDeleted)
            }
            (DeploymentAction::Create, _) => None,
            (_, FeatureStatus::Undeployed) => blocked(Reason::FeatureMustBeCreated),
            _ => None,
        }
    }

    fn check_upstream(
        &self,
        target: FeatureType,
        satisfied: &BTreeSet<FeatureType>,
    ) -> DeploymentActionCheck {
        let failing = self.graph.sorted(
            self.graph
                .upstream_of(target)
                .into_iter()
                .filter(|f| !satisfied.contains(f))
                .filter(|f| !self.store.status(*f).is_usable()),
        );

        if failing.is_empty() {
            return DeploymentActionCheck::allowed(target);
        }

        let reason = if failing
            .iter()
            .any(|f| self.store.status(*f) == FeatureStatus::Undeployed)
        {
            Reason::DependenciesMustBeCreated
        } else {
            Reason::DependenciesStatusIsInvalid
        };
        DeploymentActionCheck::blocked(target, reason, failing)
    }

    fn check_downstream(&self, target: FeatureType) -> DeploymentActionCheck {
        let blocking = self.graph.sorted(
            self.graph
                .downstream_of(target)
                .into_iter()
                .filter(|f| self.store.status(*f) != FeatureStatus::Undeployed),
        );

        if blocking.is_empty() {
            DeploymentActionCheck::allowed(target)
        } else {
            DeploymentActionCheck::blocked(target, Reason::DependenciesMustBeDeleted, blocking)
        }
    }
}
