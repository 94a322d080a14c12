// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route-rule authorization.
//!
//! The gate maps `(method, path)` to a [`Requirement`] and decides whether the
//! caller may proceed. It is a pure function of its inputs and the rule table,
//! which is fixed at construction.
//!
//! ## Rule precedence
//!
//! Rules are sorted once, most specific first, with a stable sort:
//!
//! 1. fewer `**` segments first
//! 2. more literal segments first
//! 3. fewer single-segment wildcards (`*`, `{name}`) first
//! 4. rules bound to a method before rules for any method
//!
//! Rules that tie keep their declaration order. The first matching rule wins
//! and a request matching no rule is denied.

use std::collections::BTreeSet;
use std::fmt;

use axum::http::Method;

use super::claims::Principal;
use super::roles::Role;

/// What a route demands of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone, with or without a token
    Public,
    /// Any valid principal
    AuthenticatedAny,
    /// Authorities the principal must hold: at least one of them when
    /// `match_any`, otherwise all of them
    RequiresAuthority {
        authorities: BTreeSet<String>,
        match_any: bool,
    },
    /// `SCOPE_<name>` must be held
    RequiresScope(String),
}

impl Requirement {
    /// Any one of the given roles.
    pub fn any_role(roles: &[Role]) -> Self {
        Requirement::RequiresAuthority {
            authorities: roles.iter().map(|r| r.authority().to_string()).collect(),
            match_any: true,
        }
    }

    /// Every one of the given roles.
    pub fn all_roles(roles: &[Role]) -> Self {
        Requirement::RequiresAuthority {
            authorities: roles.iter().map(|r| r.authority().to_string()).collect(),
            match_any: false,
        }
    }

    pub fn scope(name: impl Into<String>) -> Self {
        Requirement::RequiresScope(name.into())
    }

    fn evaluate(&self, principal: Option<&Principal>) -> Decision {
        let principal = match (self, principal) {
            (Requirement::Public, _) => return Decision::Allow,
            (_, None) => return Decision::Deny(DenyReason::Unauthenticated),
            (_, Some(principal)) => principal,
        };

        let allowed = match self {
            Requirement::Public | Requirement::AuthenticatedAny => true,
            Requirement::RequiresAuthority {
                authorities,
                match_any: true,
            } => authorities.iter().any(|a| principal.has_authority(a)),
            Requirement::RequiresAuthority {
                authorities,
                match_any: false,
            } => authorities.iter().all(|a| principal.has_authority(a)),
            Requirement::RequiresScope(name) => principal.has_scope(name),
        };

        if allowed {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::Forbidden)
        }
    }
}

/// Outcome of [`AuthorizationGate::authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No principal on a protected route
    Unauthenticated,
    /// Principal lacks the required authority or scope
    Forbidden,
    /// No rule covers the route
    NoMatchingRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*` or `{name}`: exactly one segment
    Single,
    /// `**`: zero or more segments
    Rest,
}

/// Ant-style path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|segment| match segment {
                "**" => Segment::Rest,
                "*" => Segment::Single,
                s if s.starts_with('{') && s.ends_with('}') => Segment::Single,
                s => Segment::Literal(s.to_string()),
            })
            .collect();
        Self {
            source: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path).collect();
        matches_segments(&self.segments, &parts)
    }

    fn count(&self, f: impl Fn(&Segment) -> bool) -> usize {
        self.segments.iter().filter(|s| f(*s)).count()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn matches_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Rest, rest)) => {
            (0..=path.len()).any(|skip| matches_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            None => false,
            Some((head, tail)) => {
                let head_ok = match segment {
                    Segment::Literal(literal) => literal == head,
                    _ => true,
                };
                head_ok && matches_segments(rest, tail)
            }
        },
    }
}

/// One entry of the access table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// `None` matches every method
    pub method: Option<Method>,
    pub pattern: PathPattern,
    pub requirement: Requirement,
}

impl RouteRule {
    pub fn new(method: Method, pattern: &str, requirement: Requirement) -> Self {
        Self {
            method: Some(method),
            pattern: PathPattern::new(pattern),
            requirement,
        }
    }

    /// Rule for every method on `pattern`.
    pub fn any_method(pattern: &str, requirement: Requirement) -> Self {
        Self {
            method: None,
            pattern: PathPattern::new(pattern),
            requirement,
        }
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }

    /// Sort key, smaller is more specific.
    fn specificity(&self) -> (usize, std::cmp::Reverse<usize>, usize, bool) {
        let pattern = &self.pattern;
        (
            pattern.count(|s| *s == Segment::Rest),
            std::cmp::Reverse(pattern.count(|s| matches!(s, Segment::Literal(_)))),
            pattern.count(|s| *s == Segment::Single),
            self.method.is_none(),
        )
    }
}

/// Decides allow/deny for a request from the static rule table.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    rules: Vec<RouteRule>,
}

impl AuthorizationGate {
    pub fn new(mut rules: Vec<RouteRule>) -> Self {
        rules.sort_by_key(RouteRule::specificity);
        Self { rules }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn matching_rule(&self, method: &Method, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.matches(method, path))
    }

    pub fn authorize(&self, method: &Method, path: &str, principal: Option<&Principal>) -> Decision {
        match self.matching_rule(method, path) {
            Some(rule) => rule.requirement.evaluate(principal),
            None => Decision::Deny(DenyReason::NoMatchingRule),
        }
    }
}
