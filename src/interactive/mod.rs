//
//  schematics-cli
//  interactive/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Terminal prompts and progress display.

mod progress;
mod prompt;

pub use progress::*;
pub use prompt::*;
