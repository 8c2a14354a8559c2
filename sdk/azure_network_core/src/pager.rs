//! Paged list results.
//!
//! List operations return `{"value": [...], "nextLink": "..."}`. The
//! `nextLink` is an absolute URL that already carries the API version.

use crate::client::NetworkClient;
use crate::error::{NetworkError, NetworkResult};
use crate::models::ListPage;
use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;

enum Cursor {
    First(String),
    Next(String),
    Done,
}

/// Fetch a single page, either from an API path or from a `nextLink` URL.
async fn fetch_page<T: DeserializeOwned>(
    client: &NetworkClient,
    cursor: Cursor,
) -> NetworkResult<Option<(Vec<T>, Cursor)>> {
    let response = match cursor {
        Cursor::First(path) => client.get(&path).await?,
        Cursor::Next(url) => client.get_url(&url).await?,
        Cursor::Done => return Ok(None),
    };

    let page = response.json::<ListPage<T>>().await?;
    tracing::trace!(
        items = page.value.len(),
        has_next = page.next_link.is_some(),
        "fetched page"
    );

    let next = match page.next_link {
        Some(link) if !link.is_empty() => Cursor::Next(link),
        _ => Cursor::Done,
    };
    Ok(Some((page.value, next)))
}

/// Lazily stream every item of a list operation, following `nextLink`.
///
/// ```rust,no_run
/// # use azure_network_core::client::NetworkClient;
/// # use azure_network_core::pager;
/// # use futures::TryStreamExt;
/// # async fn example(client: &NetworkClient) -> azure_network_core::error::NetworkResult<()> {
/// let items = pager::stream::<serde_json::Value>(
///     client,
///     format!("{}/providers/Microsoft.Network/virtualNetworks", client.subscription_path()),
/// );
/// futures::pin_mut!(items);
/// while let Some(item) = items.try_next().await? {
///     println!("{}", item["name"]);
/// }
/// # Ok(())
/// # }
/// ```
pub fn stream<'a, T>(
    client: &'a NetworkClient,
    path: String,
) -> impl Stream<Item = NetworkResult<T>> + 'a
where
    T: DeserializeOwned + 'a,
{
    stream::try_unfold(Cursor::First(path), move |cursor| fetch_page::<T>(client, cursor))
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, NetworkError>)))
        .try_flatten()
}

/// Collect every item of a list operation, following `nextLink` until the last page.
pub async fn collect_all<T: DeserializeOwned>(
    client: &NetworkClient,
    path: String,
) -> NetworkResult<Vec<T>> {
    stream::<T>(client, path).try_collect().await
}
