//! Static records served in mock mode.

use chrono::NaiveDate;

use crate::entities::{Account, Book, Employee, Enrollment, Student, User};
use crate::roles::Role;

fn student(
    id: &str,
    no: &str,
    first: &str,
    last: &str,
    grade: u8,
    section: &str,
    status: &str,
) -> Student {
    Student {
        id: id.into(),
        student_no: no.into(),
        first_name: first.into(),
        last_name: last.into(),
        grade_level: grade,
        section: Some(section.into()),
        status: status.into(),
        guardian: None,
        email: None,
    }
}

pub fn students() -> Vec<Student> {
    vec![
        Student {
            guardian: Some("Maria Santos".into()),
            email: Some("ana.santos@students.school.edu".into()),
            ..student("stu-001", "2024-0001", "Ana", "Santos", 7, "Rizal", "active")
        },
        student("stu-002", "2024-0002", "Ben", "Okoro", 7, "Rizal", "active"),
        student("stu-003", "2023-0114", "Chloe", "Nguyen", 8, "Mabini", "active"),
        student("stu-004", "2022-0087", "Diego", "Fernandez", 9, "Bonifacio", "inactive"),
        student("stu-005", "2021-0032", "Ella", "Brooks", 10, "Luna", "active"),
        student("stu-006", "2019-0210", "Farid", "Rahman", 12, "Aguinaldo", "graduated"),
    ]
}

fn employee(
    id: &str,
    no: &str,
    first: &str,
    last: &str,
    department: &str,
    position: &str,
    status: &str,
) -> Employee {
    Employee {
        id: id.into(),
        employee_no: no.into(),
        first_name: first.into(),
        last_name: last.into(),
        department: department.into(),
        position: position.into(),
        status: status.into(),
        email: None,
    }
}

pub fn employees() -> Vec<Employee> {
    vec![
        employee("emp-001", "E-1001", "Tomas", "Lindqvist", "Mathematics", "Teacher", "active"),
        employee("emp-002", "E-1002", "Rita", "Delgado", "Registrar", "Registrar", "active"),
        employee("emp-003", "E-1003", "Chen", "Wei", "Finance", "Cashier", "active"),
        employee("emp-004", "E-1004", "Lena", "Fischer", "Library", "Librarian", "on leave"),
        employee("emp-005", "E-1005", "Grace", "Adeyemi", "Science", "Department Head", "active"),
    ]
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn accounts() -> Vec<Account> {
    let line = |id: &str,
                reference: &str,
                no: &str,
                name: &str,
                description: &str,
                due: f64,
                paid: f64,
                due_date: Option<NaiveDate>| Account {
        id: id.into(),
        reference: reference.into(),
        student_no: no.into(),
        student_name: name.into(),
        description: description.into(),
        amount_due: due,
        amount_paid: paid,
        status: payment_status(due, paid).into(),
        due_date,
    };
    vec![
        line(
            "acc-001",
            "INV-24001",
            "2024-0001",
            "Ana Santos",
            "Tuition Q1",
            1200.0,
            1200.0,
            date(2024, 8, 31),
        ),
        line(
            "acc-002",
            "INV-24002",
            "2024-0002",
            "Ben Okoro",
            "Tuition Q1",
            1200.0,
            600.0,
            date(2024, 8, 31),
        ),
        line(
            "acc-003",
            "INV-24003",
            "2023-0114",
            "Chloe Nguyen",
            "Laboratory fee",
            150.0,
            0.0,
            date(2024, 9, 15),
        ),
        line(
            "acc-004",
            "INV-24004",
            "2021-0032",
            "Ella Brooks",
            "Tuition Q1",
            1350.0,
            0.0,
            date(2024, 8, 31),
        ),
        line("acc-005", "INV-24005", "2024-0001", "Ana Santos", "Library fine", 5.5, 0.0, None),
    ]
}

pub fn payment_status(due: f64, paid: f64) -> &'static str {
    if paid <= 0.0 {
        "unpaid"
    } else if paid < due {
        "partial"
    } else {
        "paid"
    }
}

pub fn enrollments() -> Vec<Enrollment> {
    let e = |id: &str, no: &str, name: &str, grade: u8, section: &str, status: &str| Enrollment {
        id: id.into(),
        student_no: no.into(),
        student_name: name.into(),
        school_year: "2024-2025".into(),
        grade_level: grade,
        section: Some(section.into()),
        status: status.into(),
    };
    vec![
        e("enr-001", "2024-0001", "Ana Santos", 7, "Rizal", "enrolled"),
        e("enr-002", "2024-0002", "Ben Okoro", 7, "Rizal", "enrolled"),
        e("enr-003", "2023-0114", "Chloe Nguyen", 8, "Mabini", "pending"),
        e("enr-004", "2022-0087", "Diego Fernandez", 9, "Bonifacio", "withdrawn"),
        e("enr-005", "2021-0032", "Ella Brooks", 10, "Luna", "enrolled"),
    ]
}

pub fn books() -> Vec<Book> {
    let b = |id: &str,
             isbn: &str,
             title: &str,
             author: &str,
             category: &str,
             total: u32,
             available: u32| Book {
        id: id.into(),
        isbn: isbn.into(),
        title: title.into(),
        author: author.into(),
        category: category.into(),
        copies_total: total,
        copies_available: available,
    };
    vec![
        b("bk-001", "978-0061120084", "To Kill a Mockingbird", "Harper Lee", "Fiction", 4, 2),
        b("bk-002", "978-0451524935", "1984", "George Orwell", "Fiction", 3, 0),
        b(
            "bk-003",
            "978-0553380163",
            "A Brief History of Time",
            "Stephen Hawking",
            "Science",
            2,
            2,
        ),
        b("bk-004", "978-0140449136", "The Odyssey", "Homer", "Classics", 5, 4),
        b(
            "bk-005",
            "978-0393354324",
            "Calculus Made Easy",
            "Silvanus P. Thompson",
            "Mathematics",
            2,
            1,
        ),
    ]
}

pub fn users() -> Vec<User> {
    let u = |id: &str, name: &str, email: &str, role: Role, status: &str| User {
        id: id.into(),
        display_name: name.into(),
        email: email.into(),
        role,
        status: status.into(),
    };
    vec![
        u("usr-0001", "Sam Okafor", "superadmin@school.edu", Role::SuperAdmin, "active"),
        u("usr-0002", "Alex Morgan", "admin@school.edu", Role::Admin, "active"),
        u("usr-0003", "Rita Delgado", "registrar@school.edu", Role::Registrar, "active"),
        u("usr-0004", "Chen Wei", "cashier@school.edu", Role::Cashier, "active"),
        u("usr-0005", "Tomas Lindqvist", "teacher@school.edu", Role::Teacher, "active"),
        u("usr-0006", "Lena Fischer", "librarian@school.edu", Role::Librarian, "active"),
        u("usr-0007", "Jordan Reyes", "student@school.edu", Role::Student, "active"),
        u("usr-0008", "Noor Haddad", "newteacher@school.edu", Role::Teacher, "invited"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Entity;
    use std::collections::HashSet;

    fn assert_valid<T: Entity>(items: Vec<T>) {
        let mut ids = HashSet::new();
        for item in &items {
            item.validate().expect("fixture validates");
            assert!(ids.insert(item.id().to_string()), "duplicate id {}", item.id());
        }
    }

    #[test]
    fn fixtures_are_valid_and_unique() {
        assert_valid(students());
        assert_valid(employees());
        assert_valid(accounts());
        assert_valid(enrollments());
        assert_valid(books());
        assert_valid(users());
    }

    #[test]
    fn payment_status_tracks_balance() {
        assert_eq!(payment_status(100.0, 0.0), "unpaid");
        assert_eq!(payment_status(100.0, 40.0), "partial");
        assert_eq!(payment_status(100.0, 100.0), "paid");
    }
}
