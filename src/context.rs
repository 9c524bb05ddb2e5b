use crate::error::Error;
use crate::model::{CandidateRecord, LibraryType};
use crate::services::{Services, VirtualLibrary};
use std::collections::HashMap;

/// Data fetched at most once per pass and dropped with it.
///
/// Keeps the number of playback server round trips bounded: every item in a
/// pass is matched against the same listing instead of re-fetching it.
pub struct PassContext<'s> {
    services: &'s Services,
    media_items: HashMap<LibraryType, Vec<CandidateRecord>>,
    favorites: Option<Vec<CandidateRecord>>,
    libraries: Option<Vec<VirtualLibrary>>,
}

impl<'s> PassContext<'s> {
    pub fn new(services: &'s Services) -> Self {
        Self {
            services,
            media_items: HashMap::new(),
            favorites: None,
            libraries: None,
        }
    }

    pub fn services(&self) -> &'s Services {
        self.services
    }

    pub fn media_items(&mut self, library_type: LibraryType) -> Result<&[CandidateRecord], Error> {
        if !self.media_items.contains_key(&library_type) {
            let items = match self.services.media_server() {
                Some(server) => server.items(library_type)?,
                None => Vec::new(),
            };
            self.media_items.insert(library_type, items);
        }
        Ok(self
            .media_items
            .get(&library_type)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub fn favorites(&mut self) -> Result<&[CandidateRecord], Error> {
        if self.favorites.is_none() {
            let favorites = match self.services.media_server() {
                Some(server) => server.favorites()?,
                None => Vec::new(),
            };
            self.favorites = Some(favorites);
        }
        Ok(self.favorites.as_deref().unwrap_or_default())
    }

    /// Virtual libraries on the playback server; newly created ones are added
    /// through [`PassContext::remember_library`].
    pub fn libraries(&mut self) -> Result<&mut Vec<VirtualLibrary>, Error> {
        if self.libraries.is_none() {
            let libraries = match self.services.media_server() {
                Some(server) => server.libraries()?,
                None => Vec::new(),
            };
            self.libraries = Some(libraries);
        }
        Ok(self.libraries.get_or_insert_with(Vec::new))
    }

    pub fn remember_library(&mut self, library: VirtualLibrary) {
        self.libraries.get_or_insert_with(Vec::new).push(library);
    }
}
