//! # Directory Repository
//!
//! Outlets, employees and customers: the parties every document refers to.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use stitch_core::validation::validate_name;
use stitch_core::{Customer, Employee, Outlet, ValidationError};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutlet {
    /// Short code printed on documents, e.g. `BLR-01`.
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub home_outlet_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
}

/// Repository for outlets, employees and customers.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: SqlitePool,
}

impl DirectoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DirectoryRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Outlets
    // -------------------------------------------------------------------------

    pub async fn create_outlet(&self, new: NewOutlet) -> DbResult<Outlet> {
        let code = new.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "code".to_string(),
            }
            .into());
        }
        validate_name("name", &new.name)?;

        let outlet = Outlet {
            id: Uuid::new_v4().to_string(),
            code,
            name: new.name.trim().to_string(),
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %outlet.id, code = %outlet.code, "Creating outlet");

        sqlx::query(
            "INSERT INTO outlets (id, code, name, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&outlet.id)
        .bind(&outlet.code)
        .bind(&outlet.name)
        .bind(outlet.is_active)
        .bind(outlet.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("outlet code", &outlet.code),
            other => other,
        })?;

        Ok(outlet)
    }

    pub async fn get_outlet(&self, id: &str) -> DbResult<Option<Outlet>> {
        let outlet = sqlx::query_as::<_, Outlet>(
            "SELECT id, code, name, is_active, created_at FROM outlets WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(outlet)
    }

    pub async fn get_outlet_by_code(&self, code: &str) -> DbResult<Option<Outlet>> {
        let outlet = sqlx::query_as::<_, Outlet>(
            "SELECT id, code, name, is_active, created_at FROM outlets WHERE code = ?1",
        )
        .bind(code.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(outlet)
    }

    pub async fn list_outlets(&self) -> DbResult<Vec<Outlet>> {
        let outlets = sqlx::query_as::<_, Outlet>(
            "SELECT id, code, name, is_active, created_at FROM outlets ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(outlets)
    }

    // -------------------------------------------------------------------------
    // Employees
    // -------------------------------------------------------------------------

    pub async fn create_employee(&self, new: NewEmployee) -> DbResult<Employee> {
        validate_name("name", &new.name)?;

        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            home_outlet_id: new.home_outlet_id,
            created_at: Utc::now(),
        };

        debug!(id = %employee.id, home_outlet = ?employee.home_outlet_id, "Creating employee");

        sqlx::query(
            "INSERT INTO employees (id, name, home_outlet_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.home_outlet_id)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn get_employee(&self, id: &str) -> DbResult<Option<Employee>> {
        let mut conn = self.pool.acquire().await?;
        employee_in(&mut conn, id).await
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    pub async fn create_customer(&self, new: NewCustomer) -> DbResult<Customer> {
        validate_name("name", &new.name)?;

        let phone = new
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            phone,
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, "Creating customer");

        sqlx::query("INSERT INTO customers (id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(customer.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => {
                    DbError::duplicate("phone", customer.phone.clone().unwrap_or_default())
                }
                other => other,
            })?;

        Ok(customer)
    }

    pub async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn find_customer_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, created_at FROM customers WHERE phone = ?1",
        )
        .bind(phone.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }
}

pub(crate) async fn employee_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, home_outlet_id, created_at FROM employees WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(employee)
}
