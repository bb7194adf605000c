use glam::Vec3;

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Bounding box of a point set; empty input gives a box that nothing hits
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = ray.direction.recip();

    let t1 = (aabb.min - ray.origin) * inv_dir;
    let t2 = (aabb.max - ray.origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Pick the nearest entry whose AABB is intersected by the ray.
/// Ties keep the earlier entry.
pub fn pick_nearest<'a, K: 'a>(
    ray: &Ray,
    boxes: impl IntoIterator<Item = (&'a K, &'a Aabb)>,
) -> Option<&'a K> {
    let mut best: Option<(&K, f32)> = None;

    for (key, aabb) in boxes {
        if let Some(dist) = ray_aabb(ray, aabb) {
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((key, dist));
            }
        }
    }

    best.map(|(key, _)| key)
}

/// Möller-Trumbore ray-triangle intersection algorithm.
/// Returns the distance along the ray if hit, or None if no intersection.
pub fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    // Intersection is behind ray origin
    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Closest approach between a ray and a segment.
/// Returns (ray parameter, point on the segment).
pub fn ray_segment_closest(ray: &Ray, start: Vec3, end: Vec3) -> (f32, Vec3) {
    let u = ray.direction;
    let v = end - start;
    let w = ray.origin - start;

    let a = u.dot(u);
    let b = u.dot(v);
    let c = v.dot(v);
    let d = u.dot(w);
    let e = v.dot(w);

    let denom = a * c - b * b;

    let tc = if denom < 1e-7 {
        // Nearly parallel
        if c > 0.0 {
            e / c
        } else {
            0.0
        }
    } else {
        (a * e - b * d) / denom
    };

    // Segment parameter is clamped first, then projected back onto the ray
    let point = start + v * tc.clamp(0.0, 1.0);
    let sc = if a > 0.0 { (point - ray.origin).dot(u) / a } else { 0.0 };
    (sc.max(0.0), point)
}
