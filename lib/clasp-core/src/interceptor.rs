//! Request interceptors.
//!
//! Interceptors rewrite the [`RequestTemplate`] before it is bound to a
//! target. They accumulate across configuration sources (never replacing one
//! another), are deduplicated by handle identity, and run in priority order.

use std::sync::Arc;

use crate::RequestTemplate;

/// Capability applied to every outgoing request template.
pub trait RequestInterceptor: Send + Sync {
    /// Rewrite the template (add headers, queries, and so on).
    fn apply(&self, template: &mut RequestTemplate);

    /// Explicit priority: lower runs first. `None` means unordered, which
    /// sorts after every explicit value.
    fn order(&self) -> Option<i32> {
        None
    }
}

/// Shared handle to a [`RequestInterceptor`].
pub type SharedInterceptor = Arc<dyn RequestInterceptor>;

/// Drop duplicate handles (same `Arc` registered through multiple sources),
/// keeping the first occurrence.
pub fn dedupe_interceptors(interceptors: &mut Vec<SharedInterceptor>) {
    let mut seen: Vec<SharedInterceptor> = Vec::with_capacity(interceptors.len());
    interceptors.retain(|candidate| {
        if seen.iter().any(|kept| Arc::ptr_eq(kept, candidate)) {
            false
        } else {
            seen.push(Arc::clone(candidate));
            true
        }
    });
}

/// Stable sort by explicit order: lower values first, unordered last, ties
/// keep their accumulated relative order.
pub fn sort_interceptors(interceptors: &mut [SharedInterceptor]) {
    interceptors.sort_by_key(|interceptor| match interceptor.order() {
        Some(order) => (false, order),
        None => (true, 0),
    });
}

/// Interceptor appending fixed headers to every request.
///
/// Carries property-supplied default request headers into the template.
#[derive(Debug, Clone)]
pub struct HeaderInterceptor {
    headers: Vec<(String, String)>,
    order: Option<i32>,
}

impl HeaderInterceptor {
    /// Create an unordered header interceptor.
    #[must_use]
    pub fn new(headers: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            headers: headers.into_iter().collect(),
            order: None,
        }
    }

    /// Set an explicit priority.
    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

impl RequestInterceptor for HeaderInterceptor {
    fn apply(&self, template: &mut RequestTemplate) {
        for (name, value) in &self.headers {
            template.header(name.clone(), value.clone());
        }
    }

    fn order(&self) -> Option<i32> {
        self.order
    }
}

/// Interceptor appending fixed query parameters to every request.
///
/// Carries property-supplied default query parameters into the template.
#[derive(Debug, Clone)]
pub struct QueryInterceptor {
    params: Vec<(String, String)>,
    order: Option<i32>,
}

impl QueryInterceptor {
    /// Create an unordered query interceptor.
    #[must_use]
    pub fn new(params: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            params: params.into_iter().collect(),
            order: None,
        }
    }

    /// Set an explicit priority.
    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

impl RequestInterceptor for QueryInterceptor {
    fn apply(&self, template: &mut RequestTemplate) {
        for (name, value) in &self.params {
            template.query(name.clone(), value.clone());
        }
    }

    fn order(&self) -> Option<i32> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use crate::Method;

    use super::*;

    struct Tagger {
        tag: &'static str,
        order: Option<i32>,
    }

    impl RequestInterceptor for Tagger {
        fn apply(&self, template: &mut RequestTemplate) {
            template.header("X-Tag", self.tag);
        }

        fn order(&self) -> Option<i32> {
            self.order
        }
    }

    fn tagger(tag: &'static str, order: Option<i32>) -> SharedInterceptor {
        Arc::new(Tagger { tag, order })
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let a = tagger("a", None);
        let b = tagger("b", None);
        let mut list = vec![Arc::clone(&a), Arc::clone(&b), Arc::clone(&a)];

        dedupe_interceptors(&mut list);
        assert_eq!(list.len(), 2);
        assert!(Arc::ptr_eq(&list[0], &a));
        assert!(Arc::ptr_eq(&list[1], &b));
    }

    #[test]
    fn sort_orders_explicit_first_unordered_last() {
        let high = tagger("high", Some(10));
        let low = tagger("low", Some(-5));
        let none_a = tagger("none-a", None);
        let none_b = tagger("none-b", None);
        let mut list = vec![
            Arc::clone(&none_a),
            Arc::clone(&high),
            Arc::clone(&none_b),
            Arc::clone(&low),
        ];

        sort_interceptors(&mut list);
        assert!(Arc::ptr_eq(&list[0], &low));
        assert!(Arc::ptr_eq(&list[1], &high));
        // Unordered keep their relative accumulation order.
        assert!(Arc::ptr_eq(&list[2], &none_a));
        assert!(Arc::ptr_eq(&list[3], &none_b));
    }

    #[test]
    fn header_interceptor_appends() {
        let mut template = RequestTemplate::new(Method::Get, "/ping");
        HeaderInterceptor::new(vec![("X-Env".to_string(), "prod".to_string())])
            .apply(&mut template);

        assert_eq!(
            template.headers(),
            &[("X-Env".to_string(), "prod".to_string())]
        );
    }

    #[test]
    fn query_interceptor_appends() {
        let mut template = RequestTemplate::new(Method::Get, "/ping");
        QueryInterceptor::new(vec![("tenant".to_string(), "acme".to_string())])
            .apply(&mut template);

        assert_eq!(
            template.queries(),
            &[("tenant".to_string(), "acme".to_string())]
        );
    }
}
