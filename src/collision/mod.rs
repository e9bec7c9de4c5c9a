//! Contact forces between immersed bodies and between bodies and walls.
//!
//! Only disks are supported: any other shape makes the models fail with
//! [`SolverError::UnsupportedShape`].

pub use self::models::{Contact, Lubrication, SoftSphere, Spring};

use itertools::Itertools;

use crate::config::CollisionConfig;
use crate::error::{Result, SolverError};
use crate::geometry::{Circle, HGrid, HGridEntry, Shape};
use crate::math::{Point, Real, Vector};
use crate::mesh::{BoundaryKind, FiniteVolumeGrid};
use crate::object::{ImmersedBody, ImmersedBodySet};

mod models;

/// One contact force model.
#[derive(Clone, Debug, PartialEq)]
pub enum CollisionModel {
    /// Hertzian repulsion with damping.
    SoftSphere(SoftSphere),
    /// Undamped quadratic repulsion.
    Spring(Spring),
    /// Thin-film lubrication.
    Lubrication(Lubrication),
}

impl CollisionModel {
    /// A short name of the model.
    pub fn name(&self) -> &'static str {
        match self {
            CollisionModel::SoftSphere(_) => "soft-sphere",
            CollisionModel::Spring(_) => "spring",
            CollisionModel::Lubrication(_) => "lubrication",
        }
    }

    /// The largest gap at which the model exerts a force on a wall.
    pub fn wall_range(&self) -> Real {
        match self {
            CollisionModel::SoftSphere(m) => m.range_wall,
            CollisionModel::Spring(m) => m.range_wall,
            CollisionModel::Lubrication(m) => m.range_wall,
        }
    }

    fn disk<'a>(&self, body: &'a ImmersedBody) -> Result<&'a Circle> {
        match &body.shape {
            Shape::Circle(c) => Ok(c),
            shape => Err(SolverError::UnsupportedShape {
                model: self.name(),
                shape: shape.type_name(),
            }),
        }
    }

    /// The force exerted on `p` by `q`.
    pub fn force(&self, p: &ImmersedBody, q: &ImmersedBody) -> Result<Vector<Real>> {
        let (cp, cq) = (self.disk(p)?, self.disk(q)?);
        let contact = Contact::between_disks(&cp.center, cp.radius, &cq.center, cq.radius);
        let (vp, vq) = (p.velocity_at(&cp.center), q.velocity_at(&cq.center));

        Ok(match self {
            CollisionModel::SoftSphere(m) => m.pair_force(&contact, &(vq - vp)),
            CollisionModel::Spring(m) => m.pair_force(&contact),
            CollisionModel::Lubrication(m) => {
                m.pair_force(&contact, cp.radius, cq.radius, &(vp - vq))
            }
        })
    }

    /// The force exerted on `body` by the wall point `wall_point`.
    pub fn force_wall_point(&self, body: &ImmersedBody, wall_point: &Point<Real>) -> Result<Vector<Real>> {
        let c = self.disk(body)?;
        let contact = Contact::with_wall(&c.center, c.radius, wall_point);
        let v = body.velocity_at(&c.center);

        Ok(match self {
            CollisionModel::SoftSphere(m) => m.wall_force(&contact, &v),
            CollisionModel::Spring(m) => m.wall_force(&contact),
            CollisionModel::Lubrication(m) => m.wall_force(&contact, c.radius, &v),
        })
    }

    /// The force exerted on `body` by the patch `patch` of `grid`.
    ///
    /// The wall is represented by the point of the patch closest to the body center, searched
    /// among the local boundary faces stored in `lookup`.
    pub fn force_wall(
        &self,
        body: &ImmersedBody,
        patch: usize,
        grid: &FiniteVolumeGrid,
        lookup: &HGrid<HGridEntry>,
    ) -> Result<Vector<Real>> {
        let c = self.disk(body)?;
        let reach = Vector::repeat(c.radius + self.wall_range() + lookup.cell_width());
        let faces = grid.faces();

        let nearest = lookup
            .elements_intersecting_aabb(&(c.center - reach), &(c.center + reach))
            .filter_map(|e| match e {
                HGridEntry::BoundaryFace(f) => Some(&faces[*f]),
                HGridEntry::Cell(_) => None,
            })
            .filter(|f| f.patch == Some(patch) && grid.is_local(f.owner))
            .map(|f| f.closest_point(&c.center))
            .min_by(|a, b| {
                na::distance_squared(a, &c.center).total_cmp(&na::distance_squared(b, &c.center))
            });

        match nearest {
            Some(point) => self.force_wall_point(body, &point),
            None => Ok(Vector::zeros()),
        }
    }
}

/// Applies the configured contact models to every pair of bodies and every body/wall pair.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionEngine {
    models: Vec<CollisionModel>,
}

impl CollisionEngine {
    /// The engine running the models enabled in `config`.
    pub fn from_config(config: &CollisionConfig) -> Result<Self> {
        let mut models = Vec::new();

        match (&config.soft_sphere, &config.spring) {
            (Some(_), Some(_)) => {
                return Err(SolverError::Configuration(
                    "ambiguous contact models: soft-sphere and spring repulsions are both configured"
                        .to_string(),
                ))
            }
            (Some(m), None) => models.push(CollisionModel::SoftSphere(m.clone())),
            (None, Some(m)) => models.push(CollisionModel::Spring(m.clone())),
            (None, None) => {}
        }

        if let Some(m) = &config.lubrication {
            models.push(CollisionModel::Lubrication(m.clone()));
        }

        Ok(Self { models })
    }

    /// The active models.
    pub fn models(&self) -> &[CollisionModel] {
        &self.models
    }

    /// Accumulates the contact forces on the bodies.
    ///
    /// Pair forces are applied with opposite signs on both bodies. Wall forces come from every
    /// `Wall` patch.
    pub fn apply(
        &self,
        bodies: &mut ImmersedBodySet,
        grid: &FiniteVolumeGrid,
        lookup: &HGrid<HGridEntry>,
    ) -> Result<()> {
        if self.models.is_empty() {
            return Ok(());
        }

        for (a, b) in bodies.handles().into_iter().tuple_combinations() {
            if let Some((p, q)) = bodies.get2_mut(a, b) {
                for model in &self.models {
                    let force = model.force(p, q)?;
                    p.apply_force(force);
                    q.apply_force(-force);
                }
            }
        }

        let walls: Vec<usize> = grid
            .patches()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == BoundaryKind::Wall)
            .map(|(i, _)| i)
            .collect();

        for body in bodies.values_mut() {
            let mut total = Vector::zeros();
            for model in &self.models {
                for patch in &walls {
                    total += model.force_wall(body, *patch, grid, lookup)?;
                }
            }
            body.apply_force(total);
        }

        Ok(())
    }
}
