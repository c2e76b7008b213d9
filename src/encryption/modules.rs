// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Additional authenticated data (AAD) construction for the modular
//! encryption scheme.
//!
//! Every encrypted module is bound to `file_aad || module type || ordinals`
//! so that moving ciphertext between modules, columns, row groups or files
//! invalidates the authentication tag.

use crate::errors::{ParquetError, Result};

/// Module types of the Parquet modular encryption scheme.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModuleType {
    Footer = 0,
    ColumnMetaData = 1,
    DataPage = 2,
    DictionaryPage = 3,
    DataPageHeader = 4,
    DictionaryPageHeader = 5,
    ColumnIndex = 6,
    OffsetIndex = 7,
}

/// Creates the AAD for the footer module of a file.
pub fn create_footer_aad(file_aad: &[u8]) -> Result<Vec<u8>> {
    create_module_aad(file_aad, ModuleType::Footer, 0, 0, None)
}

/// Creates the AAD for a module.
///
/// The footer module carries no ordinals. Page modules append the page
/// ordinal after the row group and column ordinals; all other modules stop
/// after the column ordinal.
pub fn create_module_aad(
    file_aad: &[u8],
    module_type: ModuleType,
    row_group_ordinal: usize,
    column_ordinal: usize,
    page_ordinal: Option<usize>,
) -> Result<Vec<u8>> {
    let module_buf = [module_type as u8];

    if module_type == ModuleType::Footer {
        return Ok([file_aad, &module_buf].concat());
    }

    if row_group_ordinal > u16::MAX as usize {
        return Err(general_err!(
            "Encrypted parquet files can't have more than {} row groups: {}",
            u16::MAX,
            row_group_ordinal
        ));
    }
    if column_ordinal > u16::MAX as usize {
        return Err(general_err!(
            "Encrypted parquet files can't have more than {} columns: {}",
            u16::MAX,
            column_ordinal
        ));
    }

    let row_group_ordinal_buf = (row_group_ordinal as u16).to_le_bytes();
    let column_ordinal_buf = (column_ordinal as u16).to_le_bytes();

    if module_type != ModuleType::DataPage && module_type != ModuleType::DataPageHeader {
        return Ok([
            file_aad,
            &module_buf,
            &row_group_ordinal_buf,
            &column_ordinal_buf,
        ]
        .concat());
    }

    let page_ordinal =
        page_ordinal.ok_or_else(|| general_err!("Page ordinal must be set for data pages"))?;
    if page_ordinal > u16::MAX as usize {
        return Err(general_err!(
            "Encrypted parquet files can't have more than {} pages per column chunk: {}",
            u16::MAX,
            page_ordinal
        ));
    }

    let page_ordinal_buf = (page_ordinal as u16).to_le_bytes();
    Ok([
        file_aad,
        &module_buf,
        &row_group_ordinal_buf,
        &column_ordinal_buf,
        &page_ordinal_buf,
    ]
    .concat())
}

/// Overwrites the trailing page-ordinal bytes of a data-page (or
/// data-page-header) AAD in place, avoiding a fresh allocation per page.
pub fn quick_update_page_aad(aad: &mut [u8], page_ordinal: usize) -> Result<()> {
    if page_ordinal > u16::MAX as usize {
        return Err(general_err!(
            "Encrypted parquet files can't have more than {} pages per column chunk: {}",
            u16::MAX,
            page_ordinal
        ));
    }
    let len = aad.len();
    if len < 2 {
        return Err(general_err!("AAD is too short for a page ordinal update"));
    }
    aad[len - 2..].copy_from_slice(&(page_ordinal as u16).to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_aad_layout() {
        let aad = create_footer_aad(b"fileaad").unwrap();
        assert_eq!(aad, b"fileaad\x00");
    }

    #[test]
    fn test_module_aad_layout() {
        let aad =
            create_module_aad(b"f", ModuleType::ColumnMetaData, 1, 2, None).unwrap();
        assert_eq!(aad, b"f\x01\x01\x00\x02\x00");

        let aad = create_module_aad(b"f", ModuleType::DataPage, 1, 2, Some(3)).unwrap();
        assert_eq!(aad, b"f\x02\x01\x00\x02\x00\x03\x00");

        // dictionary pages carry no page ordinal
        let aad = create_module_aad(b"f", ModuleType::DictionaryPage, 1, 2, None).unwrap();
        assert_eq!(aad, b"f\x03\x01\x00\x02\x00");
    }

    #[test]
    fn test_data_page_requires_page_ordinal() {
        let err = create_module_aad(b"f", ModuleType::DataPage, 0, 0, None).unwrap_err();
        assert!(err.to_string().contains("Page ordinal"));
    }

    #[test]
    fn test_quick_update_matches_fresh_aad() {
        let mut aad = create_module_aad(b"f", ModuleType::DataPage, 4, 7, Some(0)).unwrap();
        for page in [1usize, 2, 70, 300] {
            quick_update_page_aad(&mut aad, page).unwrap();
            let fresh = create_module_aad(b"f", ModuleType::DataPage, 4, 7, Some(page)).unwrap();
            assert_eq!(aad, fresh);
        }
    }

    #[test]
    fn test_ordinal_overflow() {
        assert!(create_module_aad(b"f", ModuleType::DataPage, 70000, 0, Some(0)).is_err());
        let mut aad = create_module_aad(b"f", ModuleType::DataPage, 0, 0, Some(0)).unwrap();
        assert!(quick_update_page_aad(&mut aad, 1 << 20).is_err());
    }
}
