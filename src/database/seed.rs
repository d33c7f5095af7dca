// ABOUTME: Sample categories and procedures for a fresh knowledge base
// ABOUTME: Loaded by the seed-procedures binary; skips anything already present
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use super::{CategoryRepository, Database, ProcedureRepository};
use crate::errors::{AppResult, ErrorCode};
use crate::models::{NewCategory, ProcedureInput};
use std::collections::HashSet;
use tracing::{debug, info};

/// Sample category definition
struct SampleCategory {
    name: &'static str,
    description: &'static str,
}

/// Sample procedure definition
struct SampleProcedure {
    title: &'static str,
    category: &'static str,
    description: &'static str,
    content: &'static str,
}

const SAMPLE_CATEGORIES: &[SampleCategory] = &[
    SampleCategory {
        name: "Nhân sự",
        description: "Các quy trình liên quan đến nhân sự và tuyển dụng",
    },
    SampleCategory {
        name: "Kế toán",
        description: "Các quy trình tài chính và kế toán",
    },
    SampleCategory {
        name: "IT",
        description: "Các quy trình công nghệ thông tin",
    },
    SampleCategory {
        name: "Hành chính",
        description: "Các quy trình hành chính văn phòng",
    },
];

const SAMPLE_PROCEDURES: &[SampleProcedure] = &[
    SampleProcedure {
        title: "Quy trình nghỉ việc",
        category: "Nhân sự",
        description: "Hướng dẫn quy trình nghỉ việc cho nhân viên",
        content: "1. Nộp đơn xin nghỉ việc trước 30 ngày\n2. Hoàn thành công việc bàn giao\n3. Thu hồi tài sản công ty\n4. Thanh toán lương và phụ cấp\n5. Nhận xác nhận nghỉ việc",
    },
    SampleProcedure {
        title: "Quy trình tuyển dụng",
        category: "Nhân sự",
        description: "Quy trình tuyển dụng nhân viên mới",
        content: "1. Xác định nhu cầu tuyển dụng\n2. Đăng tin tuyển dụng\n3. Sàng lọc hồ sơ\n4. Phỏng vấn vòng 1\n5. Phỏng vấn vòng 2\n6. Quyết định tuyển dụng\n7. Onboarding nhân viên mới",
    },
    SampleProcedure {
        title: "Quy trình báo cáo tài chính",
        category: "Kế toán",
        description: "Quy trình lập và báo cáo tài chính định kỳ",
        content: "1. Thu thập dữ liệu tài chính\n2. Kiểm tra và đối soát\n3. Lập báo cáo\n4. Phê duyệt báo cáo\n5. Gửi báo cáo cho ban lãnh đạo",
    },
    SampleProcedure {
        title: "Quy trình backup dữ liệu",
        category: "IT",
        description: "Quy trình sao lưu dữ liệu hệ thống",
        content: "1. Kiểm tra dung lượng storage\n2. Chạy backup tự động\n3. Kiểm tra backup thành công\n4. Lưu trữ backup offsite\n5. Test restore định kỳ",
    },
    SampleProcedure {
        title: "Quy trình xin phép nghỉ",
        category: "Hành chính",
        description: "Hướng dẫn xin phép nghỉ làm",
        content: "1. Điền đơn xin nghỉ phép\n2. Gửi đơn cho quản lý trực tiếp\n3. Chờ phê duyệt\n4. Thông báo kết quả\n5. Cập nhật lịch làm việc",
    },
];

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Categories inserted
    pub categories: usize,
    /// Procedures inserted
    pub procedures: usize,
    /// True when the run was skipped because procedures already existed
    pub skipped: bool,
}

/// Load the sample data
///
/// Without `force`, nothing happens when any procedure already exists.
/// With `force`, missing categories and procedures (matched by name and
/// title) are added to a non-empty store.
///
/// # Errors
///
/// Returns the store's error
pub async fn seed_sample_data(database: &Database, force: bool) -> AppResult<SeedReport> {
    let existing = database.count_procedures().await?;
    if existing > 0 && !force {
        info!(existing, "Procedures already present, skipping seed");
        return Ok(SeedReport {
            skipped: true,
            ..SeedReport::default()
        });
    }

    let mut report = SeedReport::default();

    for sample in SAMPLE_CATEGORIES {
        let category = NewCategory {
            name: sample.name.to_owned(),
            description: sample.description.to_owned(),
        };
        match database.create_category(&category).await {
            Ok(_) => report.categories += 1,
            Err(e) if e.code == ErrorCode::ResourceAlreadyExists => {
                debug!(name = sample.name, "Category already present");
            }
            Err(e) => return Err(e),
        }
    }

    let present: HashSet<String> = database
        .list_procedures(None)
        .await?
        .into_iter()
        .map(|p| p.title)
        .collect();

    for sample in SAMPLE_PROCEDURES {
        if present.contains(sample.title) {
            debug!(title = sample.title, "Procedure already present");
            continue;
        }
        let input = ProcedureInput {
            title: sample.title.to_owned(),
            content: sample.content.to_owned(),
            category: sample.category.to_owned(),
            description: sample.description.to_owned(),
        };
        database.create_procedure(&input, None).await?;
        report.procedures += 1;
    }

    info!(
        categories = report.categories,
        procedures = report.procedures,
        "Sample data seeded"
    );
    Ok(report)
}
