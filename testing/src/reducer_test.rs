//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use asset_lending_core::effect::Effect;
use asset_lending_core::error::LendingError;
use asset_lending_core::reducer::Reducer;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

/// Type alias for error assertion functions
type ErrorAssertion = Box<dyn FnOnce(&LendingError)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use asset_lending_testing::ReducerTest;
///
/// ReducerTest::new(LifecycleReducer::new())
///     .with_env(LifecycleEnvironment::new(Arc::new(test_clock())))
///     .given_state(LifecycleState::with_request(request))
///     .when_action(accept)
///     .then_state(|state| {
///         assert_eq!(state.request.as_ref().map(|r| r.status), Some(RequestStatus::Accepted));
///     })
///     .then_effects(|effects| {
///         assert_eq!(effects.len(), 2);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion>,
    error_assertions: Vec<ErrorAssertion>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    ///
    /// State assertions run whether the reduction succeeded or failed.
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    ///
    /// The reduction is expected to succeed.
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the rejection (Then)
    ///
    /// The reduction is expected to fail.
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&LendingError) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set, if the
    /// outcome (success or failure) differs from what the assertions expect,
    /// or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        // Execute reducer
        let result = self.reducer.reduce(&mut state, action, &env);

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&state);
        }

        match result {
            Ok(effects) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected the reducer to reject the action, but it produced {effects:?}"
                );
                for assertion in self.effect_assertions {
                    assertion(&effects);
                }
            },
            Err(error) => {
                assert!(
                    self.effect_assertions.is_empty(),
                    "Expected effects, but the reducer rejected the action: {error}"
                );
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            },
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use asset_lending_core::effect::Effect;
    use asset_lending_core::ledger::LedgerEffect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[Effect]) {
        assert!(
            effects.is_empty(),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain a request write
    ///
    /// # Panics
    ///
    /// Panics if no `WriteRequest` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_request_write(effects: &[Effect]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::WriteRequest(_))),
            "Expected a WriteRequest effect, but none found in {effects:?}"
        );
    }

    /// Assert the ledger effect, or its absence
    ///
    /// # Panics
    ///
    /// Panics if the ledger effects differ from `expected`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_ledger_effect(effects: &[Effect], expected: Option<LedgerEffect>) {
        let ledger: Vec<LedgerEffect> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Ledger(ledger) => Some(*ledger),
                _ => None,
            })
            .collect();
        assert_eq!(ledger, expected.into_iter().collect::<Vec<_>>());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_lending_core::effect::Effects;
    use asset_lending_core::error::Result;

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Reject,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> Result<Effects> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    Ok(Effects::new())
                },
                TestAction::Reject => Err(LendingError::Unauthorized),
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_rejection() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 5 })
            .when_action(TestAction::Reject)
            .then_state(|state| {
                assert_eq!(state.count, 5);
            })
            .then_error(|error| {
                assert_eq!(*error, LendingError::Unauthorized);
            })
            .run();
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[], 0);
        assertions::assert_ledger_effect(&[], None);
    }
}
