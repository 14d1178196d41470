//! Walking paged property-collector results.
//!
//! A retrieval returns one page at a time; while a page carries a token
//! the server keeps the rest of the result set alive. [`PropertyCursor`]
//! owns that token and fetches the next page only when the current one has
//! been read. Every walk ends in [`PropertyCursor::finish`], which cancels a
//! token that is still held, whether the walk matched, ran out or failed.

use crate::error::{VsphereError, VsphereResult};
use crate::transport::VimTransport;
use crate::types::*;

use regex::Regex;

pub const DATASTORE_PROPERTIES: [&str; 5] = [
    "summary.type",
    "summary.name",
    "summary.capacity",
    "summary.freeSpace",
    "summary.accessible",
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Cursor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One traversal over a paged result. Holds at most one page.
pub struct PropertyCursor<'a, T: VimTransport + ?Sized> {
    transport: &'a T,
    page: Option<PropertyPage>,
}

impl<'a, T: VimTransport + ?Sized> PropertyCursor<'a, T> {
    pub fn new(transport: &'a T, page: PropertyPage) -> Self {
        Self {
            transport,
            page: Some(page),
        }
    }

    /// Start a retrieval of every object of `object_type`.
    pub async fn retrieve(
        transport: &'a T,
        object_type: ObjectType,
        properties: &[String],
    ) -> VsphereResult<Self> {
        let page = transport.retrieve_objects(object_type, properties).await?;
        Ok(Self::new(transport, page))
    }

    /// Token of the current page, if more pages remain.
    pub fn token(&self) -> Option<&str> {
        self.page.as_ref().and_then(|p| p.token.as_deref())
    }

    pub fn objects(&self) -> &[ObjectContent] {
        self.page.as_ref().map(|p| p.objects.as_slice()).unwrap_or(&[])
    }

    /// Replace the current page with the next one. Returns `false` when
    /// there is nothing left. If the fetch fails the token stays held so
    /// that `release` can still cancel it.
    pub async fn advance(&mut self) -> VsphereResult<bool> {
        let Some(token) = self.token().map(str::to_owned) else {
            return Ok(false);
        };
        log::debug!("Continuing property retrieval");
        let next = self.transport.continue_retrieval(&token).await?;
        self.page = Some(next);
        Ok(true)
    }

    /// Cancel the held token, if any. Safe to call more than once.
    pub async fn release(&mut self) -> VsphereResult<()> {
        if let Some(token) = self.page.as_mut().and_then(|p| p.token.take()) {
            log::debug!("Cancelling property retrieval");
            self.transport.cancel_retrieval(&token).await?;
        }
        Ok(())
    }

    /// Visit objects in arrival order across pages until `visit` yields a
    /// value or the pages run out.
    pub async fn walk<R, F>(&mut self, mut visit: F) -> VsphereResult<Option<R>>
    where
        F: FnMut(&ObjectContent) -> VsphereResult<Option<R>>,
    {
        loop {
            for obj in self.objects() {
                if let Some(found) = visit(obj)? {
                    return Ok(Some(found));
                }
            }
            if !self.advance().await? {
                return Ok(None);
            }
        }
    }

    /// Release the cursor and hand back `outcome`. An error in `outcome`
    /// wins over a failed cancel.
    pub async fn finish<R>(mut self, outcome: VsphereResult<R>) -> VsphereResult<R> {
        let released = self.release().await;
        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(cancel)) => Err(cancel),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cancel)) => {
                log::warn!("Failed to cancel property retrieval after error: {}", cancel);
                Err(e)
            }
        }
    }
}

impl<'a, T: VimTransport + ?Sized> Drop for PropertyCursor<'a, T> {
    fn drop(&mut self) {
        if self.token().is_some() {
            log::warn!("Property cursor dropped with an unread page; server-side retrieval leaked");
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Find-first
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How a lookup recognizes its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectMatch<'v> {
    /// `obj.value` equals the target
    Reference(&'v str),
    /// First declared property is a string equal to the target
    FirstProperty(&'v str),
}

impl ObjectMatch<'_> {
    pub fn matches(&self, obj: &ObjectContent) -> bool {
        match self {
            Self::Reference(value) => obj.obj.value == *value,
            Self::FirstProperty(value) => {
                obj.first_value().and_then(PropertyValue::as_str) == Some(*value)
            }
        }
    }
}

/// First object satisfying `predicate`, fetching pages lazily.
pub async fn find_first<T, F>(
    transport: &T,
    page: PropertyPage,
    mut predicate: F,
) -> VsphereResult<Option<ObjectContent>>
where
    T: VimTransport + ?Sized,
    F: FnMut(&ObjectContent) -> VsphereResult<bool>,
{
    let mut cursor = PropertyCursor::new(transport, page);
    let outcome = cursor
        .walk(|obj| Ok(predicate(obj)?.then(|| obj.clone())))
        .await;
    cursor.finish(outcome).await
}

pub async fn find_first_by<T>(
    transport: &T,
    page: PropertyPage,
    target: ObjectMatch<'_>,
) -> VsphereResult<Option<ObjectContent>>
where
    T: VimTransport + ?Sized,
{
    find_first(transport, page, |obj| Ok(target.matches(obj))).await
}

/// First value `filter` produces, with the same paging discipline as
/// [`find_first`].
pub async fn full_scan<T, R, F>(transport: &T, page: PropertyPage, filter: F) -> VsphereResult<Option<R>>
where
    T: VimTransport + ?Sized,
    F: FnMut(&ObjectContent) -> VsphereResult<Option<R>>,
{
    let mut cursor = PropertyCursor::new(transport, page);
    let outcome = cursor.walk(filter).await;
    cursor.finish(outcome).await
}

/// Every object of every page.
pub async fn collect_all<T>(transport: &T, page: PropertyPage) -> VsphereResult<Vec<ObjectContent>>
where
    T: VimTransport + ?Sized,
{
    let mut all = Vec::new();
    let mut cursor = PropertyCursor::new(transport, page);
    let outcome = cursor
        .walk::<(), _>(|obj| {
            all.push(obj.clone());
            Ok(None)
        })
        .await;
    cursor.finish(outcome).await?;
    Ok(all)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Datastore scan
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Accepts accessible VMFS / NFS datastores whose name matches `pattern`
/// from its first character.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatastoreFilter<'r> {
    pub pattern: Option<&'r Regex>,
}

impl<'r> DatastoreFilter<'r> {
    pub fn new(pattern: Option<&'r Regex>) -> Self {
        Self { pattern }
    }

    fn required<'o>(obj: &'o ObjectContent, name: &str) -> VsphereResult<&'o PropertyValue> {
        obj.property(name).ok_or_else(|| {
            VsphereError::impossible_state(format!("Datastore {} returned without {name}", obj.obj.value))
        })
    }

    fn name_matches(&self, name: &str) -> bool {
        match self.pattern {
            None => true,
            Some(re) => re.find(name).map_or(false, |m| m.start() == 0),
        }
    }

    pub fn evaluate(&self, obj: &ObjectContent) -> VsphereResult<Option<DatastoreSelection>> {
        let ds_type = Self::required(obj, "summary.type")?.as_str().unwrap_or_default();
        let name = Self::required(obj, "summary.name")?.as_str().unwrap_or_default();
        let accessible = Self::required(obj, "summary.accessible")?.as_bool().unwrap_or(false);

        // Local storage types such as vfat are never usable.
        if !matches!(ds_type, "VMFS" | "NFS") || !accessible || !self.name_matches(name) {
            return Ok(None);
        }

        Ok(Some(DatastoreSelection {
            datastore_ref: obj.obj.clone(),
            name: name.to_string(),
            capacity: Self::required(obj, "summary.capacity")?.as_long().unwrap_or(0),
            free_space: Self::required(obj, "summary.freeSpace")?.as_long().unwrap_or(0),
        }))
    }
}

/// First usable datastore across the pages starting at `page`.
pub async fn select_datastore<T>(
    transport: &T,
    page: PropertyPage,
    pattern: Option<&Regex>,
) -> VsphereResult<DatastoreSelection>
where
    T: VimTransport + ?Sized,
{
    let filter = DatastoreFilter::new(pattern);
    full_scan(transport, page, |obj| filter.evaluate(obj))
        .await?
        .ok_or_else(|| VsphereError::datastore_not_found(pattern.map(Regex::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VsphereErrorKind;
    use crate::transport::MockVimTransport;
    use mockall::predicate::eq;

    fn vm(value: &str, name: &str) -> ObjectContent {
        ObjectContent::new(ManagedObjectRef::of(ObjectType::VirtualMachine, value))
            .with_property("name", name)
    }

    fn datastore(value: &str, name: &str, ds_type: &str, accessible: bool) -> ObjectContent {
        ObjectContent::new(ManagedObjectRef::of(ObjectType::Datastore, value))
            .with_property("summary.type", ds_type)
            .with_property("summary.name", name)
            .with_property("summary.capacity", 500_i64 << 30)
            .with_property("summary.freeSpace", 200_i64 << 30)
            .with_property("summary.accessible", accessible)
    }

    #[tokio::test]
    async fn find_first_on_last_page_cancels_nothing() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_continue_retrieval()
            .with(eq("t1"))
            .times(1)
            .returning(|_| Ok(PropertyPage::new(vec![vm("vm-3", "c"), vm("vm-4", "d")])));
        transport.expect_cancel_retrieval().times(0);

        let page1 = PropertyPage::new(vec![vm("vm-1", "a"), vm("vm-2", "b")]).with_token("t1");
        let found = find_first_by(&transport, page1, ObjectMatch::FirstProperty("d"))
            .await
            .unwrap();
        assert_eq!(found, Some(vm("vm-4", "d")));
    }

    #[tokio::test]
    async fn match_with_token_cancels_once() {
        let mut transport = MockVimTransport::new();
        transport.expect_continue_retrieval().times(0);
        transport
            .expect_cancel_retrieval()
            .with(eq("t1"))
            .times(1)
            .returning(|_| Ok(()));

        let page = PropertyPage::new(vec![vm("vm-1", "a"), vm("vm-2", "b")]).with_token("t1");
        let found = find_first_by(&transport, page, ObjectMatch::Reference("vm-1"))
            .await
            .unwrap();
        assert_eq!(found.map(|o| o.obj.value), Some("vm-1".to_string()));
    }

    #[tokio::test]
    async fn exhaustion_is_none() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_continue_retrieval()
            .times(1)
            .returning(|_| Ok(PropertyPage::new(vec![vm("vm-2", "b")])));
        transport.expect_cancel_retrieval().times(0);

        let page = PropertyPage::new(vec![vm("vm-1", "a")]).with_token("t1");
        let found = find_first_by(&transport, page, ObjectMatch::FirstProperty("zzz"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn predicate_error_releases_cursor() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_cancel_retrieval()
            .with(eq("t1"))
            .times(1)
            .returning(|_| Ok(()));

        let page = PropertyPage::new(vec![vm("vm-1", "a")]).with_token("t1");
        let err = find_first(&transport, page, |_| Err(VsphereError::impossible_state("boom")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::ImpossibleState);
    }

    #[tokio::test]
    async fn continue_failure_releases_cursor() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_continue_retrieval()
            .times(1)
            .returning(|_| Err(VsphereError::transport("ContinueRetrievePropertiesEx", "socket closed")));
        transport
            .expect_cancel_retrieval()
            .with(eq("t1"))
            .times(1)
            .returning(|_| Ok(()));

        let page = PropertyPage::new(vec![vm("vm-1", "a")]).with_token("t1");
        let err = find_first_by(&transport, page, ObjectMatch::FirstProperty("zzz"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::TransportFailure);
    }

    #[tokio::test]
    async fn failed_cancel_after_match_is_reported() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_cancel_retrieval()
            .times(1)
            .returning(|_| Err(VsphereError::transport("CancelRetrievePropertiesEx", "gone")));

        let page = PropertyPage::new(vec![vm("vm-1", "a")]).with_token("t1");
        let err = find_first_by(&transport, page, ObjectMatch::Reference("vm-1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::TransportFailure);
    }

    #[tokio::test]
    async fn collect_all_drains_pages() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_continue_retrieval()
            .with(eq("t1"))
            .times(1)
            .returning(|_| Ok(PropertyPage::new(vec![vm("vm-2", "b")]).with_token("t2")));
        transport
            .expect_continue_retrieval()
            .with(eq("t2"))
            .times(1)
            .returning(|_| Ok(PropertyPage::new(vec![vm("vm-3", "c")])));
        transport.expect_cancel_retrieval().times(0);

        let page = PropertyPage::new(vec![vm("vm-1", "a")]).with_token("t1");
        let all = collect_all(&transport, page).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.obj.value.as_str()).collect();
        assert_eq!(ids, vec!["vm-1", "vm-2", "vm-3"]);
    }

    #[tokio::test]
    async fn datastore_scan_second_page() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_continue_retrieval()
            .with(eq("t1"))
            .times(1)
            .returning(|_| {
                Ok(PropertyPage::new(vec![
                    datastore("datastore-2", "ds2", "VMFS", true),
                    datastore("datastore-3", "ds3", "NFS", true),
                ])
                .with_token("t2"))
            });
        transport
            .expect_cancel_retrieval()
            .with(eq("t2"))
            .times(1)
            .returning(|_| Ok(()));

        let page1 = PropertyPage::new(vec![
            datastore("datastore-0", "local", "vfat", true),
            datastore("datastore-1", "ds1", "VMFS", false),
        ])
        .with_token("t1");
        let sel = select_datastore(&transport, page1, None).await.unwrap();
        assert_eq!(sel.datastore_ref, ManagedObjectRef::of(ObjectType::Datastore, "datastore-2"));
        assert_eq!(sel.name, "ds2");
        assert_eq!(sel.capacity, 500_i64 << 30);
        assert_eq!(sel.free_space, 200_i64 << 30);
    }

    #[tokio::test]
    async fn datastore_regex_anchored_at_start() {
        let transport = MockVimTransport::new();
        let re = Regex::new("ssd").unwrap();
        let page = PropertyPage::new(vec![
            datastore("datastore-1", "fast-ssd", "VMFS", true),
            datastore("datastore-2", "ssd-01", "NFS", true),
        ]);
        let sel = select_datastore(&transport, page, Some(&re)).await.unwrap();
        assert_eq!(sel.name, "ssd-01");
    }

    #[tokio::test]
    async fn datastore_not_found_names_pattern() {
        let transport = MockVimTransport::new();
        let re = Regex::new("^nope").unwrap();
        let page = PropertyPage::new(vec![datastore("datastore-1", "ds1", "VMFS", true)]);
        let err = select_datastore(&transport, page, Some(&re)).await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::DatastoreNotFound);
        assert_eq!(err.key.as_deref(), Some("^nope"));

        let transport = MockVimTransport::new();
        let page = PropertyPage::new(vec![datastore("datastore-1", "ds1", "VMFS", false)]);
        let err = select_datastore(&transport, page, None).await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::DatastoreNotFound);
        assert!(err.key.is_none());
    }

    #[tokio::test]
    async fn missing_datastore_property_is_impossible() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_cancel_retrieval()
            .with(eq("t1"))
            .times(1)
            .returning(|_| Ok(()));

        let broken = ObjectContent::new(ManagedObjectRef::of(ObjectType::Datastore, "datastore-9"))
            .with_property("summary.name", "ds9");
        let page = PropertyPage::new(vec![broken]).with_token("t1");
        let err = select_datastore(&transport, page, None).await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::ImpossibleState);
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let mut transport = MockVimTransport::new();
        transport
            .expect_cancel_retrieval()
            .times(1)
            .returning(|_| Ok(()));

        let mut cursor = PropertyCursor::new(&transport, PropertyPage::new(vec![]).with_token("t1"));
        assert_eq!(cursor.token(), Some("t1"));
        cursor.release().await.unwrap();
        cursor.release().await.unwrap();
        assert!(cursor.token().is_none());
        assert!(!cursor.advance().await.unwrap());
    }
}
