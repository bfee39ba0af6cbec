/// Read-through caching around an async computation.
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`,
/// queues the result for caching with `$ttl` seconds to live and returns it.
/// Errors from the cache lookup or from `$block` are propagated with `?`, so
/// the macro must be used inside a function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// let page: TmdbPage = cached!(self.cache, CacheKey::Trending(window, page), TRENDING_TTL, async {
///     self.get_json(&path, &[]).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
