//! Install manifest parser for TACT
//!
//! The install manifest lists files that need to be installed for the game to run.
//! Files are associated with tags (e.g., "Windows", "Mac", "enUS") using a bitmask system.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use tracing::{debug, trace};

use crate::{Error, Result};
use crate::utils::read_cstring_from;

/// Magic bytes for install manifest: "IN"
const INSTALL_MAGIC: [u8; 2] = [0x49, 0x4E]; // 'I', 'N'

/// Install manifest header
#[derive(Debug, Clone)]
pub struct InstallHeader {
    /// Magic bytes "IN"
    pub magic: [u8; 2],
    /// Version (should be 1)
    pub version: u8,
    /// Hash size (usually 16 for MD5)
    pub hash_size: u8,
    /// Number of tags
    pub tag_count: u16,
    /// Number of file entries
    pub entry_count: u32,
}

/// Install tag information
#[derive(Debug, Clone)]
pub struct InstallTag {
    /// Tag name (e.g., "Windows", "Mac", "enUS")
    pub name: String,
    /// Tag type/flags
    pub tag_type: u16,
    /// Bitmask indicating which files have this tag
    pub files_mask: Vec<bool>,
}

/// Install file entry
#[derive(Debug, Clone)]
pub struct InstallEntry {
    /// File path relative to game root
    pub path: String,
    /// Content key (CKey)
    pub ckey: Vec<u8>,
    /// File size
    pub size: u32,
    /// Tags associated with this file
    pub tags: Vec<String>,
}

/// Install manifest
pub struct InstallManifest {
    /// File header
    pub header: InstallHeader,
    /// List of tags
    pub tags: Vec<InstallTag>,
    /// List of file entries
    pub entries: Vec<InstallEntry>,
}

/// Common platform tags
#[derive(Debug, Clone, PartialEq)]
pub enum Platform {
    Windows,
    Mac,
    Linux,
    All,
}

impl Platform {
    /// Get the tag name for this platform
    pub fn tag_name(&self) -> &str {
        match self {
            Platform::Windows => "Windows",
            Platform::Mac => "OSX",
            Platform::Linux => "Linux",
            Platform::All => "",
        }
    }
}

impl InstallManifest {
    /// Parse an install manifest from raw data
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        
        // Parse header
        let header = Self::parse_header(&mut cursor)?;
        debug!("Parsed install header: version={}, tags={}, entries={}", 
               header.version, header.tag_count, header.entry_count);
        
        // Calculate bytes per tag for bitmask
        let bytes_per_tag = ((header.entry_count + 7) / 8) as usize;
        
        // Parse tags
        let mut tags = Vec::with_capacity(header.tag_count as usize);
        for i in 0..header.tag_count {
            let name = read_cstring_from(&mut cursor)?;
            let tag_type = cursor.read_u16::<BigEndian>()?;
            
            // Read bitmask for this tag
            let mut mask_bytes = vec![0u8; bytes_per_tag];
            cursor.read_exact(&mut mask_bytes)?;
            
            // Convert bytes to bool vector
            let mut files_mask = Vec::with_capacity(header.entry_count as usize);
            for byte in mask_bytes {
                for bit in 0..8 {
                    if files_mask.len() < header.entry_count as usize {
                        files_mask.push((byte & (1 << bit)) != 0);
                    }
                }
            }
            
            trace!("Tag {}: name='{}', type={:#06x}, files_with_tag={}", 
                   i, name, tag_type, files_mask.iter().filter(|&&b| b).count());
            
            tags.push(InstallTag {
                name,
                tag_type,
                files_mask,
            });
        }
        
        // Parse file entries
        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for i in 0..header.entry_count {
            let path = read_cstring_from(&mut cursor)?;
            
            let mut ckey = vec![0u8; header.hash_size as usize];
            cursor.read_exact(&mut ckey)?;
            
            let size = cursor.read_u32::<BigEndian>()?;
            
            // Resolve tags for this entry
            let mut entry_tags = Vec::new();
            for tag in &tags {
                if tag.files_mask[i as usize] {
                    entry_tags.push(tag.name.clone());
                }
            }
            
            entries.push(InstallEntry {
                path,
                ckey,
                size,
                tags: entry_tags,
            });
        }
        
        debug!("Parsed {} install entries", entries.len());
        
        Ok(InstallManifest {
            header,
            tags,
            entries,
        })
    }
    
    /// Parse the install manifest header
    fn parse_header<R: Read>(reader: &mut R) -> Result<InstallHeader> {
        let mut magic = [0u8; 2];
        reader.read_exact(&mut magic)?;
        
        if magic != INSTALL_MAGIC {
            return Err(Error::BadMagic);
        }
        
        let version = reader.read_u8()?;
        let hash_size = reader.read_u8()?;
        let tag_count = reader.read_u16::<BigEndian>()?;
        let entry_count = reader.read_u32::<BigEndian>()?;
        
        Ok(InstallHeader {
            magic,
            version,
            hash_size,
            tag_count,
            entry_count,
        })
    }
    
    /// Get all files that have specific tags
    pub fn get_files_for_tags(&self, required_tags: &[&str]) -> Vec<&InstallEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                required_tags.iter().all(|tag| entry.tags.contains(&tag.to_string()))
            })
            .collect()
    }
    
    /// Get all files for a specific platform
    pub fn get_files_for_platform(&self, platform: Platform) -> Vec<&InstallEntry> {
        if platform == Platform::All {
            return self.entries.iter().collect();
        }
        
        let tag_name = platform.tag_name();
        self.get_files_for_tags(&[tag_name])
    }
    
    /// Get all unique tags in the manifest
    pub fn get_all_tags(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
    
    /// Get a specific file by path
    pub fn get_file_by_path(&self, path: &str) -> Option<&InstallEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
    
    /// Calculate total size for files with specific tags
    pub fn calculate_size_for_tags(&self, tags: &[&str]) -> u64 {
        self.get_files_for_tags(tags)
            .iter()
            .map(|entry| entry.size as u64)
            .sum()
    }
    
    /// Calculate total size for a platform
    pub fn calculate_size_for_platform(&self, platform: Platform) -> u64 {
        self.get_files_for_platform(platform)
            .iter()
            .map(|entry| entry.size as u64)
            .sum()
    }
}
